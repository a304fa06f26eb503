//! HTTP handlers of the inspection workflow: upload, detect, comment and the
//! read views. Each handler takes its backends explicitly.

pub mod comments;
pub mod detect;
pub mod files;
pub mod history;
pub mod respond;
pub mod upload;

pub use comments::{add_comment, add_comment_handler, list_comments_handler};
pub use detect::{detect_image, detect_image_handler, run_detection};
pub use files::serve_file_handler;
pub use history::{build_dashboard, dashboard_handler, history_handler, list_detections_handler};
pub use upload::{upload_image, upload_image_handler};
