use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InitRequested => {
            if state.request_init() {
                vec![Effect::Init]
            } else {
                Vec::new()
            }
        }
        Msg::FileSubmitted { filename, content } => {
            if state.submit_upload(&filename) {
                vec![Effect::AddDocument {
                    id: filename,
                    content,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::UploadCancelled { filename } => match state.remove_upload(&filename) {
            Some(true) => vec![Effect::CancelDocument { id: filename }],
            // Finished rows are only dismissed.
            Some(false) | None => Vec::new(),
        },
        Msg::QueryChanged(query) => {
            state.set_query(query);
            Vec::new()
        }
        Msg::SearchSubmitted => match state.begin_search() {
            Some((query, allowed_ids)) => vec![Effect::Search { query, allowed_ids }],
            None => Vec::new(),
        },
        Msg::DocumentFilterToggled(id) => {
            state.toggle_filter(&id);
            Vec::new()
        }
        Msg::FilterCleared => {
            state.clear_filter();
            Vec::new()
        }
        Msg::WorkerReady => {
            state.set_ready();
            Vec::new()
        }
        Msg::InitProgress { percent, status } => {
            state.set_init_progress(percent, status);
            Vec::new()
        }
        Msg::IndexProgress {
            filename,
            current,
            total,
            percent,
            at_ms,
        } => {
            state.apply_index_progress(&filename, current, total, percent, at_ms);
            Vec::new()
        }
        Msg::DocumentAdded { id, count } => {
            state.apply_document_added(&id, count);
            Vec::new()
        }
        Msg::RestoredDocs(ids) => {
            state.apply_restored(ids);
            Vec::new()
        }
        Msg::SearchResults(results) => {
            state.apply_results(results);
            Vec::new()
        }
        Msg::WorkerError { message, document } => {
            state.apply_error(message, document);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
