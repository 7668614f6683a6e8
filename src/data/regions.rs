//! Prefectures (regional units), their districts and proportional blocks

use serde::{Deserialize, Serialize};

/// Geographic area a prefecture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Hokkaido,
    Tohoku,
    Kanto,
    Chubu,
    Kinki,
    Chugoku,
    Shikoku,
    Kyushu,
}

/// A prefecture: the regional analysis unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefecture {
    pub id: String,
    pub name: String,
    pub name_en: String,
    pub area: Area,
    /// Number of single-member districts
    pub district_count: u32,
    /// Proportional block the prefecture votes in
    pub block_id: String,
}

impl Prefecture {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        name_en: impl Into<String>,
        area: Area,
        district_count: u32,
        block_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            name_en: name_en.into(),
            area,
            district_count,
            block_id: block_id.into(),
        }
    }

    /// Generate this prefecture's single-member districts.
    ///
    /// Ids are `<prefecture>-<n>`, names `<prefecture name>第<n>区`.
    pub fn districts(&self) -> Vec<District> {
        (1..=self.district_count)
            .map(|number| District {
                id: format!("{}-{}", self.id, number),
                prefecture_id: self.id.clone(),
                number,
                name: format!("{}第{}区", self.name, number),
            })
            .collect()
    }
}

/// A single-member district
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub prefecture_id: String,
    pub number: u32,
    pub name: String,
}

/// A proportional representation block: the block analysis unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub name: String,
    pub name_en: String,
    pub seats: u32,
    pub prefecture_ids: Vec<String>,
}

impl Block {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        name_en: impl Into<String>,
        seats: u32,
        prefecture_ids: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            name_en: name_en.into(),
            seats,
            prefecture_ids: prefecture_ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const PREFECTURES: &[(&str, &str, &str, Area, u32, &str)] = &[
    ("hokkaido", "北海道", "Hokkaido", Area::Hokkaido, 12, "hokkaido"),
    ("aomori", "青森県", "Aomori", Area::Tohoku, 3, "tohoku"),
    ("iwate", "岩手県", "Iwate", Area::Tohoku, 3, "tohoku"),
    ("miyagi", "宮城県", "Miyagi", Area::Tohoku, 5, "tohoku"),
    ("akita", "秋田県", "Akita", Area::Tohoku, 2, "tohoku"),
    ("yamagata", "山形県", "Yamagata", Area::Tohoku, 3, "tohoku"),
    ("fukushima", "福島県", "Fukushima", Area::Tohoku, 4, "tohoku"),
    ("ibaraki", "茨城県", "Ibaraki", Area::Kanto, 7, "kitakanto"),
    ("tochigi", "栃木県", "Tochigi", Area::Kanto, 5, "kitakanto"),
    ("gunma", "群馬県", "Gunma", Area::Kanto, 5, "kitakanto"),
    ("saitama", "埼玉県", "Saitama", Area::Kanto, 16, "kitakanto"),
    ("chiba", "千葉県", "Chiba", Area::Kanto, 14, "minamikanto"),
    ("kanagawa", "神奈川県", "Kanagawa", Area::Kanto, 20, "minamikanto"),
    ("yamanashi", "山梨県", "Yamanashi", Area::Chubu, 2, "minamikanto"),
    ("tokyo", "東京都", "Tokyo", Area::Kanto, 30, "tokyo"),
    ("niigata", "新潟県", "Niigata", Area::Chubu, 5, "hokurikushinetsu"),
    ("toyama", "富山県", "Toyama", Area::Chubu, 3, "hokurikushinetsu"),
    ("ishikawa", "石川県", "Ishikawa", Area::Chubu, 3, "hokurikushinetsu"),
    ("fukui", "福井県", "Fukui", Area::Chubu, 2, "hokurikushinetsu"),
    ("nagano", "長野県", "Nagano", Area::Chubu, 5, "hokurikushinetsu"),
    ("gifu", "岐阜県", "Gifu", Area::Chubu, 5, "tokai"),
    ("shizuoka", "静岡県", "Shizuoka", Area::Chubu, 8, "tokai"),
    ("aichi", "愛知県", "Aichi", Area::Chubu, 16, "tokai"),
    ("mie", "三重県", "Mie", Area::Kinki, 4, "tokai"),
    ("shiga", "滋賀県", "Shiga", Area::Kinki, 4, "kinki"),
    ("kyoto", "京都府", "Kyoto", Area::Kinki, 6, "kinki"),
    ("osaka", "大阪府", "Osaka", Area::Kinki, 19, "kinki"),
    ("hyogo", "兵庫県", "Hyogo", Area::Kinki, 12, "kinki"),
    ("nara", "奈良県", "Nara", Area::Kinki, 3, "kinki"),
    ("wakayama", "和歌山県", "Wakayama", Area::Kinki, 2, "kinki"),
    ("tottori", "鳥取県", "Tottori", Area::Chugoku, 2, "chugoku"),
    ("shimane", "島根県", "Shimane", Area::Chugoku, 2, "chugoku"),
    ("okayama", "岡山県", "Okayama", Area::Chugoku, 5, "chugoku"),
    ("hiroshima", "広島県", "Hiroshima", Area::Chugoku, 7, "chugoku"),
    ("yamaguchi", "山口県", "Yamaguchi", Area::Chugoku, 4, "chugoku"),
    ("tokushima", "徳島県", "Tokushima", Area::Shikoku, 2, "shikoku"),
    ("kagawa", "香川県", "Kagawa", Area::Shikoku, 3, "shikoku"),
    ("ehime", "愛媛県", "Ehime", Area::Shikoku, 4, "shikoku"),
    ("kochi", "高知県", "Kochi", Area::Shikoku, 2, "shikoku"),
    ("fukuoka", "福岡県", "Fukuoka", Area::Kyushu, 11, "kyushu"),
    ("saga", "佐賀県", "Saga", Area::Kyushu, 2, "kyushu"),
    ("nagasaki", "長崎県", "Nagasaki", Area::Kyushu, 3, "kyushu"),
    ("kumamoto", "熊本県", "Kumamoto", Area::Kyushu, 4, "kyushu"),
    ("oita", "大分県", "Oita", Area::Kyushu, 3, "kyushu"),
    ("miyazaki", "宮崎県", "Miyazaki", Area::Kyushu, 3, "kyushu"),
    ("kagoshima", "鹿児島県", "Kagoshima", Area::Kyushu, 4, "kyushu"),
    ("okinawa", "沖縄県", "Okinawa", Area::Kyushu, 4, "kyushu"),
];

/// The built-in prefecture table (47 entries, in JIS order)
pub fn builtin_prefectures() -> Vec<Prefecture> {
    PREFECTURES
        .iter()
        .map(|&(id, name, name_en, area, count, block)| {
            Prefecture::new(id, name, name_en, area, count, block)
        })
        .collect()
}

/// The built-in proportional block table (11 entries)
pub fn builtin_blocks() -> Vec<Block> {
    vec![
        Block::new("hokkaido", "北海道", "Hokkaido", 8, &["hokkaido"]),
        Block::new(
            "tohoku",
            "東北",
            "Tohoku",
            13,
            &["aomori", "iwate", "miyagi", "akita", "yamagata", "fukushima"],
        ),
        Block::new(
            "kitakanto",
            "北関東",
            "Kita-Kanto",
            19,
            &["ibaraki", "tochigi", "gunma", "saitama"],
        ),
        Block::new(
            "minamikanto",
            "南関東",
            "Minami-Kanto",
            22,
            &["chiba", "kanagawa", "yamanashi"],
        ),
        Block::new("tokyo", "東京", "Tokyo", 17, &["tokyo"]),
        Block::new(
            "hokurikushinetsu",
            "北陸信越",
            "Hokuriku-Shin'etsu",
            11,
            &["niigata", "toyama", "ishikawa", "fukui", "nagano"],
        ),
        Block::new(
            "tokai",
            "東海",
            "Tokai",
            21,
            &["gifu", "shizuoka", "aichi", "mie"],
        ),
        Block::new(
            "kinki",
            "近畿",
            "Kinki",
            28,
            &["shiga", "kyoto", "osaka", "hyogo", "nara", "wakayama"],
        ),
        Block::new(
            "chugoku",
            "中国",
            "Chugoku",
            11,
            &["tottori", "shimane", "okayama", "hiroshima", "yamaguchi"],
        ),
        Block::new(
            "shikoku",
            "四国",
            "Shikoku",
            6,
            &["tokushima", "kagawa", "ehime", "kochi"],
        ),
        Block::new(
            "kyushu",
            "九州",
            "Kyushu",
            20,
            &[
                "fukuoka",
                "saga",
                "nagasaki",
                "kumamoto",
                "oita",
                "miyazaki",
                "kagoshima",
                "okinawa",
            ],
        ),
    ]
}
