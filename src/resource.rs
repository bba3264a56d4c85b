use url::Url;

/// Just a wrapper around the server base URL
#[derive(Clone, Debug)]
pub struct Resource {
    url: Url,
}

impl Resource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url { &self.url }

    /// Build a new Resource by keeping the same scheme and server from `base` but changing the path part
    pub fn combine(&self, new_path: &str) -> Resource {
        let mut built = (*self).clone();
        built.url.set_path(new_path);
        built.url.set_query(None);
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_replaces_the_path() {
        let base = Resource::new(Url::parse("https://tasks.example.com/some/page?x=1").unwrap());
        let combined = base.combine("/api/tasks/12/approve");
        assert_eq!(combined.url().as_str(), "https://tasks.example.com/api/tasks/12/approve");
        assert_eq!(base.url().path(), "/some/page");
    }
}
