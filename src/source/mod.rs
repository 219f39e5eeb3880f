/// Book/chapter/verse source text.
pub mod scripture;
