use std::collections::BTreeMap;

const DEFAULT_LINKS: [(&str, &str); 5] = [
    ("green plant", "https://www.amazon.com/s?k=green+plant"),
    ("queen bed", "https://www.amazon.com/s?k=queen+bed"),
    ("wooden nightstand", "https://www.amazon.com/s?k=wooden+nightstand"),
    ("colorful rug", "https://www.amazon.com/s?k=colorful+rug"),
    ("desk", "https://www.amazon.com/s?k=desk"),
];

/// Component name to shopping URL table. Keys are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopLinks {
    links: BTreeMap<String, String>,
}

impl Default for ShopLinks {
    fn default() -> Self {
        Self {
            links: DEFAULT_LINKS
                .iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
        }
    }
}

impl ShopLinks {
    /// Default table with `extra` entries layered on top.
    pub fn with_overrides<'a>(extra: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut links = Self::default();
        for (name, url) in extra {
            links.links.insert(name.to_lowercase(), url.clone());
        }
        links
    }

    pub fn lookup(&self, component: &str) -> Option<&str> {
        self.links
            .get(&component.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
