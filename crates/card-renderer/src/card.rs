//! SVG card templates.

use crate::amount::format_amount;
use serde::Deserialize;

const WIDTH: u32 = 300;
const HEIGHT: u32 = 400;

/// Which card design to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTemplate {
    /// Plain black card with a gift motif.
    #[default]
    Generic,
    /// Valentine variant: pink palette, heart motif.
    Cupid,
}

/// Everything that appears on a card.
#[derive(Debug, Clone, Deserialize)]
pub struct CardSpec {
    /// Card value in wei.
    pub amount: u128,
    /// The gift message, rendered centered in script type.
    pub message: String,
    /// Display name of the sender, if they gave one.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Sender's wallet address, always shown in the footer.
    pub sender_address: String,
}

struct Palette {
    background: &'static str,
    text: &'static str,
    footer: &'static str,
    motif: &'static str,
}

impl CardTemplate {
    fn palette(&self) -> Palette {
        match self {
            CardTemplate::Generic => Palette {
                background: "#000000",
                text: "#ffffff",
                footer: "#9e9e9e",
                motif: "\u{1F381}",
            },
            CardTemplate::Cupid => Palette {
                background: "#d81b60",
                text: "#fff0f3",
                footer: "#f8bbd0",
                motif: "\u{1F498}",
            },
        }
    }
}

/// Render a card to an SVG document.
pub fn render(spec: &CardSpec, template: CardTemplate) -> String {
    let palette = template.palette();
    let amount = xml_escape(&format_amount(spec.amount));
    let message = xml_escape(&spec.message);
    let address = xml_escape(&spec.sender_address);

    let sender_name = match &spec.sender_name {
        Some(name) => format!(
            r#"<text x="150" y="360" text-anchor="middle" fill="{}" font-size="13">{}</text>"#,
            palette.text,
            xml_escape(name)
        ),
        None => String::new(),
    };

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="{w}" height="{h}" rx="16" fill="{background}"/>
<text x="284" y="32" text-anchor="end" fill="{text}" font-size="18" font-weight="bold">{amount}</text>
<text x="150" y="150" text-anchor="middle" font-size="48">{motif}</text>
<text x="150" y="220" text-anchor="middle" fill="{text}" font-size="24" font-style="italic">{message}</text>
{sender_name}
<text x="150" y="382" text-anchor="middle" fill="{footer}" font-size="8">{address}</text>
</svg>"#,
        w = WIDTH,
        h = HEIGHT,
        background = palette.background,
        text = palette.text,
        footer = palette.footer,
        motif = palette.motif,
        amount = amount,
        message = message,
        sender_name = sender_name,
        address = address,
    )
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
