use crate::infra::{DiscardReports, HtmlReportDirectory, InMemoryOverrideRepository};
use clap::Args;
use edupath::config::AppConfig;
use edupath::error::AppError;
use edupath::workflows::allocation::report::{render_text_table, AllocationSummary};
use edupath::workflows::allocation::{
    AllocationRun, AllocationService, Catalog, OverrideTable, ReportPublisher,
};
use edupath::workflows::roster::{RosterImporter, RosterSchema, SubjectColumns};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Roster CSV with a student id column, a name column and one column per subject
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// University catalog JSON (defaults to APP_CATALOG_PATH)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Comma separated subject columns; all remaining columns are used when omitted
    #[arg(long, value_delimiter = ',')]
    pub(crate) subjects: Vec<String>,
    /// CSV of manual overrides with student_id,university,course columns
    #[arg(long)]
    pub(crate) overrides: Option<PathBuf>,
    /// Write per-student and full HTML reports into this directory
    #[arg(long)]
    pub(crate) report_dir: Option<PathBuf>,
    /// Print the allocation run as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let AllocateArgs {
        roster,
        catalog,
        subjects,
        overrides,
        report_dir,
        json,
    } = args;

    let config = AppConfig::load()?;
    let catalog_path = catalog.unwrap_or(config.allocation.catalog_path);
    let catalog = Catalog::from_path(&catalog_path)?;

    let mut schema = config.allocation.roster;
    let subjects = SubjectColumns::declared_or_inferred(
        subjects
            .into_iter()
            .map(|subject| subject.trim().to_string())
            .filter(|subject| !subject.is_empty())
            .collect(),
    );
    if subjects != SubjectColumns::Inferred {
        schema = schema.with_subjects(subjects);
    }

    let overrides = match overrides {
        Some(path) => OverrideTable::from_csv_path(path)?,
        None => OverrideTable::new(),
    };
    let repository = Arc::new(InMemoryOverrideRepository::seeded(overrides));

    let (run, summary) = match &report_dir {
        Some(dir) => {
            let publisher = Arc::new(HtmlReportDirectory::new(dir));
            allocate_file(&roster, catalog.clone(), schema, repository, publisher)?
        }
        None => {
            let publisher = Arc::new(DiscardReports);
            allocate_file(&roster, catalog.clone(), schema, repository, publisher)?
        }
    };

    if json {
        let body = serde_json::to_string_pretty(&run.view(&catalog))
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{body}");
        return Ok(());
    }

    println!("{}", render_text_table(&run));
    println!();
    render_summary(&summary);
    if let Some(dir) = report_dir {
        println!("\nReports written to {}", dir.display());
    }

    Ok(())
}

fn allocate_file<P>(
    roster_path: &Path,
    catalog: Catalog,
    schema: RosterSchema,
    repository: Arc<InMemoryOverrideRepository>,
    publisher: Arc<P>,
) -> Result<(AllocationRun, AllocationSummary), AppError>
where
    P: ReportPublisher + 'static,
{
    let roster = RosterImporter::from_path(roster_path, &schema)?;
    let service = AllocationService::new(catalog, schema, repository, publisher);
    let run = service.allocate(roster)?;
    let summary = run.summary(service.catalog());
    Ok((run, summary))
}

fn render_summary(summary: &AllocationSummary) {
    println!(
        "Students: {}  Allocated: {}  Unallocated: {}  Overrides: {}",
        summary.total_students, summary.allocated, summary.unallocated, summary.overridden
    );

    for university in &summary.university_load {
        println!("  {} ({} students)", university.university, university.students);
        for course in &university.courses {
            println!("    - {}: {}", course.course, course.students);
        }
    }
}
