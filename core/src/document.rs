//! Paper records as consumed by the index and the search engine.

use serde::{Deserialize, Serialize};

/// A single paper. Every field defaults to empty so lookups never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Comma-joined author names.
    pub authors: String,
    pub categories: Vec<String>,
    pub primary_category: String,
    pub published: String,
    pub updated: String,
    pub url: String,
    pub pdf_url: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), abstract_text: abstract_text.into(), ..Self::default() }
    }

    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = authors.into();
        self
    }

    /// Sets the category list; the first entry becomes the primary category unless one is already set.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        if self.primary_category.is_empty() {
            self.primary_category = self.categories.first().cloned().unwrap_or_default();
        }
        self
    }

    pub fn with_primary_category(mut self, category: impl Into<String>) -> Self {
        self.primary_category = category.into();
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = published.into();
        self
    }

    /// Text the index is built over.
    pub fn indexed_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text)
    }

    /// Publication year from the leading four characters of `published`.
    pub fn year(&self) -> Option<i32> {
        self.published.get(..4)?.parse().ok()
    }
}

/// Wire shape accepted from corpus files. Tolerates the field names used by
/// the various catalog exports (`paper_id`, `category`, space-joined categories).
#[derive(Deserialize)]
struct DocumentRecord {
    #[serde(default, alias = "paper_id")]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract", alias = "summary")]
    abstract_text: Option<String>,
    #[serde(default)]
    authors: Option<Authors>,
    #[serde(default)]
    categories: Option<Categories>,
    #[serde(default, alias = "category")]
    primary_category: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    pdf_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Authors {
    Joined(String),
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Categories {
    Joined(String),
    List(Vec<String>),
}

impl From<DocumentRecord> for Document {
    fn from(rec: DocumentRecord) -> Self {
        let categories: Vec<String> = match rec.categories {
            Some(Categories::Joined(s)) => s
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect(),
            Some(Categories::List(list)) => list.into_iter().filter(|c| !c.trim().is_empty()).collect(),
            None => Vec::new(),
        };
        let primary_category = match rec.primary_category {
            Some(p) if !p.trim().is_empty() => p.trim().to_owned(),
            _ => categories.first().cloned().unwrap_or_default(),
        };
        let authors = match rec.authors {
            Some(Authors::Joined(s)) => s,
            Some(Authors::List(list)) => list.join(", "),
            None => String::new(),
        };
        Document {
            id: rec.id.unwrap_or_default(),
            title: rec.title.unwrap_or_default(),
            abstract_text: rec.abstract_text.unwrap_or_default(),
            authors,
            categories,
            primary_category,
            published: rec.published.unwrap_or_default(),
            updated: rec.updated.unwrap_or_default(),
            url: rec.url.unwrap_or_default(),
            pdf_url: rec.pdf_url.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let doc: Document = serde_json::from_str(r#"{"id": "p9"}"#).unwrap();
        assert_eq!(doc.id, "p9");
        assert_eq!(doc.title, "");
        assert_eq!(doc.abstract_text, "");
        assert!(doc.categories.is_empty());
        assert_eq!(doc.primary_category, "");
        assert_eq!(doc.year(), None);
    }

    #[test]
    fn export_field_names_are_accepted() {
        let doc: Document = serde_json::from_str(
            r#"{"paper_id": "1706.03762", "title": "Attention", "abstract": "x",
                "authors": "Vaswani, Shazeer", "categories": "cs.CL cs.LG",
                "published": "2017-06-12", "pdf_url": null}"#,
        )
        .unwrap();
        assert_eq!(doc.id, "1706.03762");
        assert_eq!(doc.categories, vec!["cs.CL", "cs.LG"]);
        assert_eq!(doc.primary_category, "cs.CL");
        assert_eq!(doc.pdf_url, "");
        assert_eq!(doc.year(), Some(2017));
    }

    #[test]
    fn explicit_primary_category_wins() {
        let doc: Document = serde_json::from_str(
            r#"{"id": "a", "categories": ["cs.LG", "stat.ML"], "category": "stat.ML"}"#,
        )
        .unwrap();
        assert_eq!(doc.primary_category, "stat.ML");
    }

    #[test]
    fn unparsable_year_is_none() {
        let doc = Document::new("x", "t", "a").with_published("n.d.");
        assert_eq!(doc.year(), None);
        let short = Document::new("y", "t", "a").with_published("99");
        assert_eq!(short.year(), None);
    }

    #[test]
    fn serializes_with_abstract_key() {
        let doc = Document::new("p1", "Title", "Body").with_categories(["cs.AI"]);
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["abstract"], "Body");
        assert_eq!(v["primary_category"], "cs.AI");
    }
}
