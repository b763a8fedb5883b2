/// Requests for the worker produced by [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Init,
    AddDocument {
        id: String,
        content: String,
    },
    CancelDocument {
        id: String,
    },
    Search {
        query: String,
        /// `None` searches every document.
        allowed_ids: Option<Vec<String>>,
    },
}
