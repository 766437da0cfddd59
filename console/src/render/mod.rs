//! Rendering of reconciled state
//!
//! Renderers only see finished state; they never feed back into the board.

pub mod terminal;
pub mod view;

use crate::models::log_entry::LogEntry;
use crate::models::notice::Notice;
use crate::render::view::RowView;

pub trait Renderer: Send {
    /// A target row changed
    fn render_row(&mut self, row: &RowView);

    /// An entry was appended to the journal
    fn render_log(&mut self, entry: &LogEntry);

    /// The journal was cleared
    fn render_log_cleared(&mut self) {}

    fn render_notice(&mut self, notice: &Notice);
}
