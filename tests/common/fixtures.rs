//! Reduced reference tables

use senkyo::data::{Area, Block, Candidate, CandidateStatus, Party, Prefecture};
use senkyo::Catalog;

pub const PREFECTURE_IDS: [&str; 3] = ["alpha", "beta", "gamma"];
pub const BLOCK_IDS: [&str; 2] = ["north", "south"];

pub fn fixture_catalog() -> Catalog {
    let parties = vec![
        Party::new("ldp", "自由民主党", "Liberal Democratic Party", "自民", "#e60012"),
        Party::new("chudou", "中道改革連合", "Centrist Reform Alliance", "中道", "#1e90ff"),
        Party::new("ishin", "日本維新の会", "Nippon Ishin", "維新", "#38b48b"),
        Party::new("other", "その他", "Other", "他", "#999999"),
    ];

    let prefectures = vec![
        Prefecture::new("alpha", "アルファ県", "Alpha", Area::Tohoku, 2, "north"),
        Prefecture::new("beta", "ベータ県", "Beta", Area::Tohoku, 1, "north"),
        Prefecture::new("gamma", "ガンマ県", "Gamma", Area::Kyushu, 1, "south"),
    ];

    let blocks = vec![
        Block::new("north", "北方", "North", 6, &["alpha", "beta"]),
        Block::new("south", "南方", "South", 6, &["gamma"]),
    ];

    let candidates = vec![
        Candidate::in_district("alpha-1-ldp", "試験一郎", "ldp", "alpha-1")
            .with_status(CandidateStatus::Incumbent),
        Candidate::in_district("alpha-1-chudou", "試験花子", "chudou", "alpha-1"),
        Candidate::list_only("north-list-ishin", "名簿次郎", "ishin"),
    ];

    Catalog::new(parties, prefectures, blocks, candidates)
}
