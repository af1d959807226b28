use super::super::catalog::Catalog;
use super::super::run::AllocationRun;
use super::views::{
    AllocationRowView, AllocationRunView, AllocationSummary, CourseLoadEntry, UniversityLoadEntry,
};

impl AllocationRun {
    /// Aggregates placements per university and course.
    ///
    /// Universities and courses appear in catalog order, including those with no students.
    /// Computed placements are counted by catalog position, so universities sharing a name
    /// keep separate entries.
    /// Placements outside the catalog (manual overrides naming other institutions) follow in
    /// the order they were first seen.
    pub fn summary(&self, catalog: &Catalog) -> AllocationSummary {
        let (allocated, unallocated, overridden) = AllocationSummary::count(&self.results);

        let mut university_load: Vec<UniversityLoadEntry> = catalog
            .universities()
            .iter()
            .map(|university| UniversityLoadEntry {
                university: university.name.clone(),
                students: 0,
                courses: university
                    .courses
                    .iter()
                    .map(|course| CourseLoadEntry {
                        course: course.name.clone(),
                        students: 0,
                    })
                    .collect(),
            })
            .collect();

        for result in self.results.iter().filter(|result| result.is_allocated()) {
            if let Some((uni_idx, course_idx)) = result.catalog_position {
                if let Some(entry) = university_load.get_mut(uni_idx) {
                    if let Some(course) = entry.courses.get_mut(course_idx) {
                        course.students += 1;
                        entry.students += 1;
                        continue;
                    }
                }
            }

            // overrides carry names only; they land on the first university of that name
            let idx = match university_load
                .iter()
                .position(|entry| entry.university == result.university)
            {
                Some(idx) => idx,
                None => {
                    university_load.push(UniversityLoadEntry {
                        university: result.university.clone(),
                        students: 0,
                        courses: Vec::new(),
                    });
                    university_load.len() - 1
                }
            };

            let entry = &mut university_load[idx];
            entry.students += 1;
            match entry
                .courses
                .iter_mut()
                .find(|course| course.course == result.course)
            {
                Some(course) => course.students += 1,
                None => entry.courses.push(CourseLoadEntry {
                    course: result.course.clone(),
                    students: 1,
                }),
            }
        }

        AllocationSummary {
            total_students: self.results.len(),
            allocated,
            unallocated,
            overridden,
            university_load,
        }
    }

    pub fn rows(&self) -> Vec<AllocationRowView> {
        self.entries()
            .map(|(record, result)| AllocationRowView::new(result, &self.breakdown(record)))
            .collect()
    }

    pub fn view(&self, catalog: &Catalog) -> AllocationRunView {
        AllocationRunView {
            generated_at: self.generated_at,
            subjects: self.roster.subjects().to_vec(),
            summary: self.summary(catalog),
            allocations: self.rows(),
        }
    }
}
