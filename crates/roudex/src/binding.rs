/// Per-route configuration captured by an extraction middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    collection: String,
    param: String,
    stash: String,
}

impl RouteBinding {
    /// Binds `collection` to the route parameter `param`, the document is stashed under `stash`
    /// or, when not given, under the collection name
    pub fn new(collection: impl Into<String>, param: impl Into<String>, stash: Option<&str>) -> Self {
        let collection = collection.into();
        let stash = stash.map_or_else(|| collection.clone(), str::to_string);
        Self { collection, param: param.into(), stash }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn stash(&self) -> &str {
        &self.stash
    }
}
