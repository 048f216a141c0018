//! Style sheet and textual boilerplate
//!
//! Paragraph presets, color constants, the contact footer and Spanish month
//! names. Everything here is a compile-time constant shared by every build.

use chrono::{Datelike, NaiveDate};

use crate::types::{Alignment, Color, FontWeight};

// ===== Colors =====

pub const HEADER_FOOTER_GREEN: Color = Color::rgb(0.0, 102.0 / 255.0, 0.0);
pub const COMPANY_HEADER_BLUE: Color = Color::rgb(82.0 / 255.0, 139.0 / 255.0, 166.0 / 255.0);
pub const TABLE_BLUE: Color = Color::rgb(141.0 / 255.0, 179.0 / 255.0, 226.0 / 255.0);
pub const FOOTER_BLUE: Color = Color::rgb(84.0 / 255.0, 141.0 / 255.0, 212.0 / 255.0);
pub const LINK_BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
pub const BLACK: Color = Color::black();

// ===== Contact footer =====

pub const ADDRESS: &str = "Calle 9A  No. 54 - 129 Guayabal";
pub const PHONE: &str = "PBX: (4) 362 00 62";
pub const CELPHONE: &str = "Cel. 312 296 84 50";
pub const WHATSAPP: &str = "WhatsApp 301  249 92 84";
pub const WEBSITE: &str = "www.vibromontajes.com";
pub const EMAIL: &str = "servicios@vibromontajes.com";
pub const FOOTER_CITY: &str = "Medellín, Colombia";
pub const LETTER_CITY: &str = "Medellín";

pub const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// "18 de octubre de 2026"
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

// ===== Paragraph styles =====

/// Named paragraph preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub name: &'static str,
    pub weight: FontWeight,
    pub font_size: f64,
    pub leading: f64,
    pub text_color: Color,
    pub alignment: Alignment,
}

impl ParagraphStyle {
    const fn preset(
        name: &'static str,
        weight: FontWeight,
        font_size: f64,
        text_color: Color,
        alignment: Alignment,
    ) -> Self {
        Self {
            name,
            weight,
            font_size,
            leading: 12.0,
            text_color,
            alignment,
        }
    }
}

pub const STANDARD: ParagraphStyle =
    ParagraphStyle::preset("standard", FontWeight::Regular, 10.0, BLACK, Alignment::Left);
pub const STANDARD_CENTER: ParagraphStyle = ParagraphStyle::preset(
    "standard_center",
    FontWeight::Regular,
    10.0,
    BLACK,
    Alignment::Center,
);
pub const STANDARD_HEADER: ParagraphStyle = ParagraphStyle::preset(
    "standard_header",
    FontWeight::Regular,
    10.0,
    BLACK,
    Alignment::Right,
);
pub const STANDARD_JUSTIFIED: ParagraphStyle = ParagraphStyle::preset(
    "standard_justified",
    FontWeight::Regular,
    10.0,
    BLACK,
    Alignment::Justify,
);
pub const BLACK_BOLD: ParagraphStyle =
    ParagraphStyle::preset("black_bold", FontWeight::Bold, 10.0, BLACK, Alignment::Left);
pub const BLACK_BOLD_CENTER: ParagraphStyle = ParagraphStyle::preset(
    "black_bold_center",
    FontWeight::Bold,
    10.0,
    BLACK,
    Alignment::Center,
);
pub const BLUE_HEADER: ParagraphStyle = ParagraphStyle::preset(
    "blue_header",
    FontWeight::Bold,
    10.0,
    COMPANY_HEADER_BLUE,
    Alignment::Right,
);
pub const BLUE_FOOTER: ParagraphStyle = ParagraphStyle::preset(
    "blue_footer",
    FontWeight::Bold,
    10.0,
    FOOTER_BLUE,
    Alignment::Center,
);
pub const BLACK_SMALL: ParagraphStyle =
    ParagraphStyle::preset("black_small", FontWeight::Regular, 7.0, BLACK, Alignment::Center);
pub const GREEN_SMALL: ParagraphStyle = ParagraphStyle::preset(
    "green_small",
    FontWeight::Regular,
    7.0,
    HEADER_FOOTER_GREEN,
    Alignment::Center,
);

/// Read-only registry of the named presets
pub struct StyleSheet;

impl StyleSheet {
    const ALL: [&'static ParagraphStyle; 10] = [
        &STANDARD,
        &STANDARD_CENTER,
        &STANDARD_HEADER,
        &STANDARD_JUSTIFIED,
        &BLACK_BOLD,
        &BLACK_BOLD_CENTER,
        &BLUE_HEADER,
        &BLUE_FOOTER,
        &BLACK_SMALL,
        &GREEN_SMALL,
    ];

    pub fn get(name: &str) -> Option<&'static ParagraphStyle> {
        Self::ALL.iter().copied().find(|style| style.name == name)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|style| style.name)
    }
}
