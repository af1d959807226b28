mod publisher;
mod render;
mod summary;
pub mod views;

pub use publisher::{PublishError, ReportPublisher};
pub use render::{
    allocations_table_html, escape_html, full_report_html, render_text_table, student_report_html,
    student_report_file_name, FULL_REPORT_FILE,
};
pub use views::{
    AllocationRowView, AllocationRunView, AllocationSummary, CourseLoadEntry, UniversityLoadEntry,
};
