use crate::errors::{AppError, AppResult};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} {prefix:>5} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar for a source crawl, one tick per page fetched.
///
/// `label` is shown as the bar prefix, e.g. `"BOE"` or `"CDTI"`.
///
/// ```no_run
/// use subvenciones_cli::ui;
///
/// # fn main() -> Result<(), subvenciones_cli::errors::AppError> {
/// let pb = ui::create_progress_bar(15, "BOE")?;
/// pb.inc(1);
/// pb.finish_with_message("sumarios consultados");
/// # Ok(())
/// # }
/// ```
pub fn create_progress_bar(total: u64, label: &str) -> AppResult<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .map_err(|e| {
                AppError::IoError(format!("Failed to create progress bar template: {e}"))
            })?
            .progress_chars("#>-"),
    );
    pb.set_prefix(label.to_string());
    Ok(pb)
}

/// Progress bar drawn inside `multi`, so bars of concurrent crawls stack instead
/// of overwriting each other.
pub fn add_progress_bar(multi: &MultiProgress, total: u64, label: &str) -> AppResult<ProgressBar> {
    Ok(multi.add(create_progress_bar(total, label)?))
}
