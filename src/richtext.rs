//! Inline text spans used for header and footer notes.
//!
//! A [`Span`] carries the inline decorations that page notes need on top of their base style:
//! bold, italic, color, underline and a link target. `genpdf` supports neither underlines nor
//! links, so both travel next to the [`StyledString`] in a [`StyledSpan`]. The underline is drawn
//! by [`crate::elements::UnderlinedLine`] and the link becomes a `/URI` annotation in
//! [`crate::metadata::finalize`].

use genpdf::style::{Color, Style, StyledString};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
    underline: bool,
    url: Option<String>,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Raw text of the span.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn is_underlined(&self) -> bool {
        self.underline
    }

    /// Link target, if the span is a link.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Marks the span as underlined.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Assigns a color to the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Turns the span into a colored, underlined link to `url`.
    pub fn link(mut self, url: impl Into<String>, color: Color) -> Self {
        self.url = Some(url.into());
        self.colored(color).underline()
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        style
    }

    /// Converts the span to a [`StyledString`], dropping the underline flag.
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

/// A styled fragment ready for `genpdf` together with its underline flag and link target.
#[derive(Clone, Debug)]
pub struct StyledSpan {
    /// The styled text fragment.
    pub string: StyledString,
    /// Whether the fragment should be rendered with an underline.
    pub underline: bool,
    /// Target of the fragment when it is a link.
    pub url: Option<String>,
}

impl StyledSpan {
    pub fn new(string: StyledString, underline: bool) -> Self {
        Self {
            string,
            underline,
            url: None,
        }
    }

    /// Attaches a link target.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl From<&Span> for StyledSpan {
    fn from(span: &Span) -> Self {
        let styled = StyledSpan::new(span.to_styled_string(), span.underline);
        match &span.url {
            Some(url) => styled.with_url(url.as_str()),
            None => styled,
        }
    }
}

/// Converts spans into styled fragments, layering each span over `base`.
pub fn styled_spans<'a, I>(spans: I, base: Style) -> Vec<StyledSpan>
where
    I: IntoIterator<Item = &'a Span>,
{
    spans
        .into_iter()
        .map(StyledSpan::from)
        .map(|mut span| {
            span.string.style = base.and(span.string.style);
            span
        })
        .collect()
}

/// Concatenates the raw text of a line of spans.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_to_style_reflects_flags() {
        let styled = Span::new("Hello")
            .bold()
            .italic()
            .colored(Color::Rgb(10, 20, 30))
            .to_styled_string();
        assert_eq!(styled.s, "Hello");
        assert!(styled.style.is_bold());
        assert!(styled.style.is_italic());
        assert_eq!(styled.style.color(), Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn link_spans_keep_underline_through_conversion() {
        let spans = [
            Span::new("see "),
            Span::new("github.com/philprime/cv")
                .link("https://github.com/philprime/cv", Color::Rgb(0, 0, 255)),
        ];
        let styled = styled_spans(&spans, Style::new().italic().with_font_size(8));

        assert!(!styled[0].underline);
        assert_eq!(styled[0].url, None);
        assert!(styled[1].underline);
        assert_eq!(
            styled[1].url.as_deref(),
            Some("https://github.com/philprime/cv")
        );
        assert!(styled[1].string.style.is_italic());
        assert_eq!(styled[1].string.style.font_size(), 8);
        assert_eq!(styled[1].string.style.color(), Some(Color::Rgb(0, 0, 255)));
        assert_eq!(plain_text(&spans), "see github.com/philprime/cv");
    }

    #[test]
    fn underlined_spans_are_not_links() {
        let span = Span::new("emphasis").underline();
        assert!(span.is_underlined());
        assert_eq!(span.url(), None);
        assert_eq!(StyledSpan::from(&span).url, None);
    }
}
