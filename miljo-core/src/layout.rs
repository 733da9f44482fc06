//! Report layout: typed blocks, fixed heights and the pagination rule.
//!
//! Deciding what to draw is kept apart from drawing it. The layout engine
//! turns a classification result into a flat run of blocks, the paginator
//! assigns blocks to pages, and the PDF backend in the report crate only
//! walks pages and draws. That split makes page breaks testable with
//! synthetic block runs.

use crate::result::ClassificationResult;

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// Vertical cursor limit; the strip below it is reserved for the footer.
pub const CONTENT_LIMIT_MM: f64 = 272.0;

/// Where the cursor starts on every page.
pub const TOP_MARGIN_MM: f64 = 18.0;

pub const REPORT_TITLE: &str = "Miljörapport";
pub const REPORT_SUBTITLE: &str = "AI-stödd klimatanalys av inköpsdata";

/// Printed centered at the bottom of every page.
pub const DISCLAIMER: &str =
    "Rapporten är automatiskt genererad. Siffrorna är uppskattningar och ersätter inte en granskad klimatredovisning.";

/// Decorative prefix in front of every stat line.
pub const STAT_PREFIX: &str = "›";

/// Rotating band colors for category sections (RGB, 0..1).
pub const SECTION_PALETTE: [(f64, f64, f64); 5] = [
    (0.13, 0.45, 0.26),
    (0.16, 0.32, 0.55),
    (0.72, 0.45, 0.12),
    (0.42, 0.26, 0.52),
    (0.62, 0.18, 0.22),
];

/// Rotating glyphs for recommendation cards.
pub const REC_GLYPHS: [&str; 3] = ["•", "›", "»"];

/// One summary card on the cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub label: String,
    pub value: String,
    pub unit: String,
}

/// One labelled figure inside a category section.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

/// A visual block. Heights are fixed per kind, which is what makes the
/// pagination rule deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Banner { title: String, subtitle: String },
    Meta { label: String, value: String },
    CardRow(Vec<Card>),
    Section {
        index: usize,
        title: String,
        color: usize,
        stats: Vec<Stat>,
    },
    Heading(String),
    Recommendation { index: usize, text: String },
    /// Forces the next block onto a fresh page.
    PageBreak,
}

impl Block {
    /// Vertical space the block consumes, in millimetres.
    pub fn height_mm(&self) -> f64 {
        match self {
            Block::Banner { .. } => 30.0,
            Block::Meta { .. } => 7.0,
            Block::CardRow(_) => 34.0,
            Block::Section { .. } => 42.0,
            Block::Heading(_) => 14.0,
            Block::Recommendation { .. } => 18.0,
            Block::PageBreak => 0.0,
        }
    }
}

/// The blocks assigned to one output page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

/// Assign blocks to pages. A new page starts when the cursor would pass
/// `limit_mm` before the next block fits, or at an explicit [`Block::PageBreak`].
/// Never emits an empty page.
pub fn paginate(blocks: Vec<Block>, limit_mm: f64) -> Vec<Page> {
    let mut pages: Vec<Page> = Vec::new();
    let mut current: Vec<Block> = Vec::new();
    let mut cursor = TOP_MARGIN_MM;

    for block in blocks {
        if matches!(block, Block::PageBreak) {
            if !current.is_empty() {
                pages.push(Page {
                    blocks: std::mem::take(&mut current),
                });
            }
            cursor = TOP_MARGIN_MM;
            continue;
        }

        if !current.is_empty() && cursor + block.height_mm() > limit_mm {
            pages.push(Page {
                blocks: std::mem::take(&mut current),
            });
            cursor = TOP_MARGIN_MM;
        }

        cursor += block.height_mm();
        current.push(block);
    }

    if !current.is_empty() {
        pages.push(Page { blocks: current });
    }
    pages
}

/// Lay out the full report: cover, one section per category, then the
/// recommendation cards.
pub fn build_blocks(
    filename: &str,
    generated: &str,
    result: &ClassificationResult,
) -> Vec<Block> {
    let mut blocks = vec![
        Block::Banner {
            title: REPORT_TITLE.to_string(),
            subtitle: REPORT_SUBTITLE.to_string(),
        },
        Block::Meta {
            label: "Källa".to_string(),
            value: filename.to_string(),
        },
        Block::Meta {
            label: "Genererad".to_string(),
            value: generated.to_string(),
        },
    ];

    let summary = &result.summary;
    blocks.push(Block::CardRow(vec![
        card("Antal artiklar", format_quantity(summary.total_items), "st"),
        card("Total kostnad", format_amount(summary.total_cost), "kr"),
    ]));
    blocks.push(Block::CardRow(vec![
        card(
            "Totala utsläpp",
            format_amount(result.total_emissions_sum()),
            "kg CO2e",
        ),
        card("Total energi", format_amount(summary.total_energy), "kWh"),
    ]));

    blocks.push(Block::PageBreak);
    for (i, cat) in result.categories.iter().enumerate() {
        blocks.push(Block::Section {
            index: i + 1,
            title: cat.name.clone(),
            color: i % SECTION_PALETTE.len(),
            stats: vec![
                stat("Antal", format!("{} st", format_quantity(cat.totals.quantity))),
                stat("Utsläpp", format!("{} kg CO2e", format_amount(cat.emissions_sum()))),
                stat("Kostnad", format!("{} kr", format_amount(cat.totals.cost))),
                stat("Energi", format!("{} kWh", format_amount(cat.totals.energy))),
            ],
        });
    }

    blocks.push(Block::PageBreak);
    blocks.push(Block::Heading("Rekommendationer".to_string()));
    for (i, text) in result.recommendations.iter().enumerate() {
        blocks.push(Block::Recommendation {
            index: i,
            text: text.clone(),
        });
    }

    blocks
}

fn card(label: &str, value: String, unit: &str) -> Card {
    Card {
        label: label.to_string(),
        value,
        unit: unit.to_string(),
    }
}

fn stat(label: &str, value: String) -> Stat {
    Stat {
        label: label.to_string(),
        value,
    }
}

/// Swedish digit grouping, rounded to whole units: 10000.4 prints as
/// "10 000" with non-breaking spaces between groups.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let grouped = group_digits(rounded.abs() as u64);
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Quantities keep one decimal only when they need it: 5 prints as "5",
/// 2.5 as "2,5".
pub fn format_quantity(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format_amount(value)
    } else {
        format!("{value:.1}").replace('.', ",")
    }
}

fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('\u{a0}');
        }
        out.push(ch);
    }
    out
}
