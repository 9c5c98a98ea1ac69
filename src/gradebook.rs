//! In-memory subject and student registries with a write-through mirror in the
//! workspace key-value store.
//!
//! Subject position is the only link between a subject and a student's mark:
//! renaming or removing a subject leaves already-recorded marks where they were.

use crate::calc::{self, Remark, Status};
use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SUBJECTS_KEY: &str = "subjectNames";
pub const STUDENTS_KEY: &str = "students";

#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("Invalid or duplicate name")]
    InvalidName,
    #[error("invalid marks in {} field(s); marks must be whole numbers from 0 to 100", .fields.len())]
    InvalidMarks { fields: Vec<usize> },
    #[error("add at least one subject before entering marks")]
    NoSubjects,
    #[error("{given} marks given for {subjects} subjects")]
    TooManyMarks { given: usize, subjects: usize },
    #[error("{kind} index {index} out of range ({len} present)")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    #[error("clearing everything requires confirmation")]
    ConfirmationRequired,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GradebookError {
    pub fn code(&self) -> &'static str {
        match self {
            GradebookError::InvalidName => "invalid_name",
            GradebookError::InvalidMarks { .. } => "invalid_marks",
            GradebookError::NoSubjects => "no_subjects",
            GradebookError::TooManyMarks { .. } => "bad_params",
            GradebookError::IndexOutOfRange { .. } => "not_found",
            GradebookError::ConfirmationRequired => "confirmation_required",
            GradebookError::Store(_) => "db_write_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub name: String,
    pub marks: Vec<i64>,
    pub total: i64,
    pub percentage: f64,
    pub status: Status,
    pub remarks: Remark,
}

impl StudentRecord {
    pub fn new(name: String, marks: Vec<i64>) -> Self {
        let d = calc::derive(&marks);
        Self {
            name,
            marks,
            total: d.total,
            percentage: d.percentage,
            status: d.status,
            remarks: d.remark,
        }
    }
}

/// Only the raw fields are read back; everything else is re-derived.
#[derive(Debug, Deserialize)]
struct StoredStudent {
    name: String,
    marks: Vec<i64>,
}

/// What goes back into the entry form when a student is opened for editing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDraft {
    pub name: String,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectRegistry {
    names: Vec<String>,
}

impl SubjectRegistry {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Appends `Subject N+1` unless that name is already taken.
    pub fn add_default(&mut self) -> Option<String> {
        let name = format!("Subject {}", self.names.len() + 1);
        if self.contains(&name) {
            return None;
        }
        self.names.push(name.clone());
        Some(name)
    }

    /// Returns `false` (and leaves the registry alone) when another position
    /// already uses `new_name`.
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<bool, GradebookError> {
        let len = self.names.len();
        if index >= len {
            return Err(GradebookError::IndexOutOfRange {
                kind: "subject",
                index,
                len,
            });
        }
        let taken_elsewhere = self
            .names
            .iter()
            .enumerate()
            .any(|(i, n)| i != index && n == new_name);
        if taken_elsewhere {
            return Ok(false);
        }
        self.names[index] = new_name.to_string();
        Ok(true)
    }

    pub fn remove(&mut self, index: usize) -> Result<String, GradebookError> {
        let len = self.names.len();
        if index >= len {
            return Err(GradebookError::IndexOutOfRange {
                kind: "subject",
                index,
                len,
            });
        }
        Ok(self.names.remove(index))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRegistry {
    records: Vec<StudentRecord>,
}

impl StudentRegistry {
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn get(&self, index: usize) -> Result<&StudentRecord, GradebookError> {
        self.records
            .get(index)
            .ok_or(GradebookError::IndexOutOfRange {
                kind: "student",
                index,
                len: self.records.len(),
            })
    }

    fn push(&mut self, record: StudentRecord) {
        self.records.push(record);
    }

    pub fn remove(&mut self, index: usize) -> Result<StudentRecord, GradebookError> {
        self.get(index)?;
        Ok(self.records.remove(index))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gradebook {
    subjects: SubjectRegistry,
    students: StudentRegistry,
}

impl Gradebook {
    /// Hydrates both registries. Missing or unreadable entries start empty.
    pub fn load(conn: &Connection) -> Self {
        let names: Vec<String> = match db::kv_get_json(conn, SUBJECTS_KEY) {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => {
                warn!(key = SUBJECTS_KEY, error = %e, "ignoring unreadable stored subjects");
                Vec::new()
            }
        };
        let stored: Vec<StoredStudent> = match db::kv_get_json(conn, STUDENTS_KEY) {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => {
                warn!(key = STUDENTS_KEY, error = %e, "ignoring unreadable stored students");
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let mut subjects = SubjectRegistry::default();
        for name in names {
            if seen.insert(name.clone()) {
                subjects.names.push(name);
            } else {
                warn!(subject = %name, "dropping duplicate stored subject");
            }
        }

        let mut seen = HashSet::new();
        let mut students = StudentRegistry::default();
        for s in stored {
            if !s.marks.iter().all(|&m| calc::in_range(m)) {
                warn!(student = %s.name, "dropping stored student with out-of-range marks");
            } else if seen.insert(s.name.clone()) {
                students.push(StudentRecord::new(s.name, s.marks));
            } else {
                warn!(student = %s.name, "dropping duplicate stored student");
            }
        }

        info!(
            subjects = subjects.len(),
            students = students.len(),
            "gradebook loaded"
        );
        Self { subjects, students }
    }

    pub fn subjects(&self) -> &SubjectRegistry {
        &self.subjects
    }

    pub fn students(&self) -> &StudentRegistry {
        &self.students
    }

    fn save_subjects(&self, conn: &Connection) -> anyhow::Result<()> {
        db::kv_set_json(conn, SUBJECTS_KEY, self.subjects.names())
    }

    fn save_students(&self, conn: &Connection) -> anyhow::Result<()> {
        db::kv_set_json(conn, STUDENTS_KEY, self.students.records())
    }

    fn commit_subjects(
        &mut self,
        conn: &Connection,
        before: SubjectRegistry,
    ) -> Result<(), GradebookError> {
        if let Err(e) = self.save_subjects(conn) {
            self.subjects = before;
            return Err(e.into());
        }
        Ok(())
    }

    fn commit_students(
        &mut self,
        conn: &Connection,
        before: StudentRegistry,
    ) -> Result<(), GradebookError> {
        if let Err(e) = self.save_students(conn) {
            self.students = before;
            return Err(e.into());
        }
        Ok(())
    }

    /// `Ok(None)` when the generated default name already exists.
    pub fn add_subject(&mut self, conn: &Connection) -> Result<Option<String>, GradebookError> {
        let before = self.subjects.clone();
        let Some(name) = self.subjects.add_default() else {
            debug!(count = self.subjects.len(), "default subject name taken; not adding");
            return Ok(None);
        };
        self.commit_subjects(conn, before)?;
        info!(subject = %name, "subject added");
        Ok(Some(name))
    }

    pub fn rename_subject(
        &mut self,
        conn: &Connection,
        index: usize,
        new_name: &str,
    ) -> Result<bool, GradebookError> {
        let before = self.subjects.clone();
        if !self.subjects.rename(index, new_name)? {
            debug!(index, name = %new_name, "subject name in use; rename ignored");
            return Ok(false);
        }
        self.commit_subjects(conn, before)?;
        info!(index, name = %new_name, "subject renamed");
        Ok(true)
    }

    pub fn remove_subject(&mut self, conn: &Connection, index: usize) -> Result<String, GradebookError> {
        let before = self.subjects.clone();
        let removed = self.subjects.remove(index)?;
        self.commit_subjects(conn, before)?;
        info!(index, subject = %removed, "subject removed");
        Ok(removed)
    }

    /// Validates the whole form before touching anything: a rejected submission
    /// leaves both memory and the store as they were.
    pub fn submit_student(
        &mut self,
        conn: &Connection,
        name: &str,
        raw_marks: &[String],
    ) -> Result<&StudentRecord, GradebookError> {
        let name = name.trim();
        if name.is_empty() || self.students.contains_name(name) {
            return Err(GradebookError::InvalidName);
        }

        if self.subjects.is_empty() {
            return Err(GradebookError::NoSubjects);
        }
        let subject_count = self.subjects.len();
        if raw_marks.len() > subject_count {
            return Err(GradebookError::TooManyMarks {
                given: raw_marks.len(),
                subjects: subject_count,
            });
        }

        // One field per subject; positions the form did not send count as blank.
        let mut fields = raw_marks.to_vec();
        fields.resize(subject_count, String::new());
        let marks = calc::validate_marks(&fields)
            .map_err(|fields| GradebookError::InvalidMarks { fields })?;

        let before = self.students.clone();
        self.students.push(StudentRecord::new(name.to_string(), marks));
        self.commit_students(conn, before)?;

        let index = self.students.len() - 1;
        let record = &self.students.records[index];
        info!(
            student = %record.name,
            total = record.total,
            status = record.status.as_str(),
            "student recorded"
        );
        Ok(record)
    }

    pub fn delete_student(
        &mut self,
        conn: &Connection,
        index: usize,
    ) -> Result<StudentRecord, GradebookError> {
        let before = self.students.clone();
        let removed = self.students.remove(index)?;
        self.commit_students(conn, before)?;
        info!(index, student = %removed.name, "student deleted");
        Ok(removed)
    }

    /// Hands the record back as a form draft and deletes it. There is no
    /// in-place update: the edited record returns only through a new submission.
    pub fn edit_student(
        &mut self,
        conn: &Connection,
        index: usize,
    ) -> Result<StudentDraft, GradebookError> {
        let record = self.students.get(index)?;
        // One field per current subject: extra stored marks drop, missing ones come back blank.
        let draft = StudentDraft {
            name: record.name.clone(),
            marks: (0..self.subjects.len())
                .map(|i| record.marks.get(i).map(ToString::to_string).unwrap_or_default())
                .collect(),
        };
        self.delete_student(conn, index)?;
        Ok(draft)
    }

    pub fn clear_all(&mut self, conn: &Connection, confirmed: bool) -> Result<(), GradebookError> {
        if !confirmed {
            return Err(GradebookError::ConfirmationRequired);
        }
        let removed = db::kv_clear(conn)?;
        self.subjects = SubjectRegistry::default();
        self.students = StudentRegistry::default();
        info!(keys_removed = removed, "gradebook cleared");
        Ok(())
    }
}
