use scraper::{Html, Node};

/// A run of display-name content: plain text or a custom emoji image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emoji(CustomEmoji),
}

/// An inline `img.custom-emoji`. `src` is what is currently displayed;
/// `original` and `static_src` carry the `data-original` and `data-static`
/// variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEmoji {
    pub shortcode: String,
    pub src: String,
    pub original: Option<String>,
    pub static_src: Option<String>,
}

impl CustomEmoji {
    pub fn is_animated(&self) -> bool {
        self.original.as_deref() == Some(self.src.as_str()) && self.original != self.static_src
    }
}

/// Splits a display-name fragment into text runs and custom emoji. With
/// autoplay off, each emoji starts on its static variant.
pub fn parse_display_name(html: &str, autoplay: bool) -> Vec<Inline> {
    let fragment = Html::parse_fragment(html);
    let mut runs: Vec<Inline> = Vec::new();

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => {
                let text: &str = text;
                match runs.last_mut() {
                    Some(Inline::Text(run)) => run.push_str(text),
                    _ => runs.push(Inline::Text(text.to_string())),
                }
            }
            Node::Element(element)
                if element.name() == "img" && element.classes().any(|c| c == "custom-emoji") =>
            {
                let original = element.attr("data-original").map(str::to_string);
                let static_src = element.attr("data-static").map(str::to_string);
                let preferred = if autoplay { &original } else { &static_src };
                let src = preferred
                    .clone()
                    .or_else(|| element.attr("src").map(str::to_string))
                    .unwrap_or_default();

                runs.push(Inline::Emoji(CustomEmoji {
                    shortcode: element.attr("alt").unwrap_or_default().to_string(),
                    src,
                    original,
                    static_src,
                }));
            }
            _ => {}
        }
    }

    runs.retain(|run| !matches!(run, Inline::Text(text) if text.is_empty()));
    runs
}

/// Flattens status content to plain text. Paragraphs become blank-line
/// separated, `<br>` becomes a newline.
pub fn status_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => match element.name() {
                "br" => out.push('\n'),
                "p" if !out.is_empty() => out.push_str("\n\n"),
                "img" => {
                    if let Some(alt) = element.attr("alt") {
                        out.push_str(alt);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    out.trim().to_string()
}
