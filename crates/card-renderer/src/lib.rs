//! Gift card image generation.
//!
//! Renders the card that becomes the NFT's image: a 300x400 canvas
//! with the amount top-right, the message centered, and the sender at
//! the bottom. Output is plain SVG so previews and minted images are
//! byte-identical for the same inputs.

mod amount;
mod card;

pub use amount::format_amount;
pub use card::{render, CardSpec, CardTemplate};
