use std::collections::HashMap;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mind_core::{AppViewModel, UploadRowView, UploadStatus};

const INIT_TEMPLATE: &str = "{spinner:.green} model {bar:40.cyan/blue} {pos:>3}% {wide_msg}";
const UPLOAD_TEMPLATE: &str = "{prefix:>20} {bar:30.green/white} {pos}/{len} chunks {wide_msg}";

/// Terminal progress for initialization and uploads.
pub struct Renderer {
    bars: MultiProgress,
    init: Option<ProgressBar>,
    uploads: HashMap<String, ProgressBar>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            bars: MultiProgress::new(),
            init: None,
            uploads: HashMap::new(),
        }
    }

    pub fn render(&mut self, view: &AppViewModel) {
        self.render_init(view);
        for upload in &view.uploads {
            self.render_upload(upload);
        }
        // Rows the user removed.
        self.uploads.retain(|filename, bar| {
            let keep = view.upload(filename).is_some();
            if !keep {
                bar.abandon_with_message("cancelled");
            }
            keep
        });
    }

    fn render_init(&mut self, view: &AppViewModel) {
        let Some(init) = &view.init else {
            return;
        };
        if self.init.as_ref().is_some_and(|bar| bar.is_finished()) {
            return;
        }
        let bar = self.init.get_or_insert_with(|| {
            let bar = self.bars.add(ProgressBar::new(100));
            bar.set_style(style(INIT_TEMPLATE));
            bar
        });
        bar.set_position(init.percent.clamp(0.0, 100.0).round() as u64);
        if view.ready {
            bar.finish_with_message(init.status.clone());
        } else if let Some(err) = &view.init_error {
            bar.abandon_with_message(format!("failed: {err}"));
        } else {
            bar.set_message(init.status.clone());
        }
    }

    fn render_upload(&mut self, upload: &UploadRowView) {
        let bar = self
            .uploads
            .entry(upload.filename.clone())
            .or_insert_with(|| {
                let bar = self.bars.add(ProgressBar::new(0));
                bar.set_style(style(UPLOAD_TEMPLATE));
                bar.set_prefix(upload.filename.clone());
                bar
            });
        // Resubmitted after finishing.
        if bar.is_finished() && upload.status.is_active() {
            bar.reset();
        }
        if bar.is_finished() {
            return;
        }
        bar.set_length(upload.total as u64);
        bar.set_position(upload.current as u64);
        match upload.status {
            UploadStatus::Pending => bar.set_message("queued"),
            UploadStatus::Processing => {
                bar.set_message(upload.etr.clone().unwrap_or_default());
            }
            UploadStatus::Completed => bar.finish_with_message("done"),
            UploadStatus::Error => {
                let reason = upload.error.clone().unwrap_or_default();
                bar.abandon_with_message(format!("failed: {reason}"));
            }
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}
