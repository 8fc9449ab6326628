//! Built-in vocabulary
//!
//! A small catalog used when the configured catalog cannot be loaded, and the
//! generic vocabulary used for themes the catalog does not know.

use super::types::{Theme, Vocabularies, VocabularyEntry};

fn entries(pairs: &[(&str, &str)]) -> Vec<VocabularyEntry> {
    pairs.iter().map(|(p, l)| VocabularyEntry::new(*p, *l)).collect()
}

fn theme(id: &str, name: &str, titles: &[&str], vocabularies: Vocabularies) -> Theme {
    Theme {
        id: id.to_string(),
        name: name.to_string(),
        titles: titles.iter().map(|t| t.to_string()).collect(),
        vocabularies,
    }
}

/// Default themes, in display order
pub fn default_themes() -> Vec<Theme> {
    vec![
        theme(
            "supermarket",
            "超市",
            &["走进超市", "超市购物记", "周末逛超市"],
            Vocabularies {
                characters: entries(&[("shōu yín yuán", "收银员"), ("gù kè", "顾客"), ("lǐ huò yuán", "理货员")]),
                items: Some(entries(&[
                    ("gòu wù chē", "购物车"),
                    ("lán zi", "篮子"),
                    ("píng guǒ", "苹果"),
                    ("niú nǎi", "牛奶"),
                ])),
                animals: None,
                facilities: entries(&[("huò jià", "货架"), ("shōu yín tái", "收银台"), ("bīng guì", "冰柜")]),
                environment: entries(&[("chū kǒu", "出口"), ("jià gé pái", "价格牌")]),
            },
        ),
        theme(
            "zoo",
            "动物园",
            &["快乐动物园", "动物园一日游"],
            Vocabularies {
                characters: entries(&[("sì yǎng yuán", "饲养员"), ("yóu kè", "游客")]),
                items: None,
                animals: Some(entries(&[
                    ("xióng māo", "熊猫"),
                    ("hóu zi", "猴子"),
                    ("cháng jǐng lù", "长颈鹿"),
                    ("dà xiàng", "大象"),
                ])),
                facilities: entries(&[("lóng zi", "笼子"), ("wéi lán", "围栏")]),
                environment: entries(&[("dà shù", "大树"), ("cǎo dì", "草地"), ("chí táng", "池塘")]),
            },
        ),
        theme(
            "hospital",
            "医院",
            &["去医院看病", "医院里的一天"],
            Vocabularies {
                characters: entries(&[("yī shēng", "医生"), ("hù shi", "护士"), ("bìng rén", "病人")]),
                items: Some(entries(&[("tīng zhěn qì", "听诊器"), ("tǐ wēn jì", "体温计"), ("yào", "药")])),
                animals: None,
                facilities: entries(&[("bìng chuáng", "病床"), ("guà hào chù", "挂号处")]),
                environment: entries(&[("zǒu láng", "走廊"), ("chuāng hu", "窗户")]),
            },
        ),
    ]
}

/// Generic vocabulary for themes the catalog cannot resolve
pub fn generic_vocabularies() -> Vocabularies {
    Vocabularies {
        characters: entries(&[("xiǎo péng yǒu", "小朋友"), ("lǎo shī", "老师")]),
        items: Some(entries(&[("shū bāo", "书包"), ("qì qiú", "气球")])),
        animals: None,
        facilities: entries(&[("zhuō zi", "桌子")]),
        environment: entries(&[("lán tiān", "蓝天"), ("bái yún", "白云")]),
    }
}
