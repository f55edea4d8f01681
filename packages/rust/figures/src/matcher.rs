//! Ordered image-matching rules applied to a paper page.

/// One image-tag pattern. Patterns are evaluated in [`ImageMatcher::ORDERED`]
/// order; a figure's position in the result follows the first pattern that
/// matched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMatcher {
    SrcFigure,
    SrcFig,
    AltFigure,
    AltFig,
    SrcPng,
    SrcJpg,
    SrcJpeg,
    SrcSvg,
}

impl ImageMatcher {
    /// All matchers in evaluation order.
    pub const ORDERED: [ImageMatcher; 8] = [
        Self::SrcFigure,
        Self::SrcFig,
        Self::AltFigure,
        Self::AltFig,
        Self::SrcPng,
        Self::SrcJpg,
        Self::SrcJpeg,
        Self::SrcSvg,
    ];

    /// CSS selector for this matcher. Attribute substring matches are
    /// case-sensitive.
    pub fn css(self) -> &'static str {
        match self {
            Self::SrcFigure => r#"img[src*="figure"]"#,
            Self::SrcFig => r#"img[src*="fig"]"#,
            Self::AltFigure => r#"img[alt*="Figure"]"#,
            Self::AltFig => r#"img[alt*="Fig"]"#,
            Self::SrcPng => r#"img[src*="png"]"#,
            Self::SrcJpg => r#"img[src*="jpg"]"#,
            Self::SrcJpeg => r#"img[src*="jpeg"]"#,
            Self::SrcSvg => r#"img[src*="svg"]"#,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SrcFigure => "src-figure",
            Self::SrcFig => "src-fig",
            Self::AltFigure => "alt-figure",
            Self::AltFig => "alt-fig",
            Self::SrcPng => "src-png",
            Self::SrcJpg => "src-jpg",
            Self::SrcJpeg => "src-jpeg",
            Self::SrcSvg => "src-svg",
        }
    }
}
