use crate::calc;
use crate::gradebook::StudentRecord;
use serde::Serialize;

pub const EXPORT_FILE_NAME: &str = "Student_Results.pdf";

const TABLE_LEADING: &str = "Student Name";
const TABLE_TRAILING: [&str; 5] = ["Total", "Percentage", "Status", "Remarks", "Actions"];
const EXPORT_LEADING: &str = "Name";
const EXPORT_TRAILING: [&str; 4] = ["Total", "Percentage", "Status", "Remarks"];

pub fn column_headers(subjects: &[String]) -> Vec<String> {
    let mut headers = Vec::with_capacity(subjects.len() + 1 + TABLE_TRAILING.len());
    headers.push(TABLE_LEADING.to_string());
    headers.extend(subjects.iter().cloned());
    headers.extend(TABLE_TRAILING.iter().map(|h| h.to_string()));
    headers
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub index: usize,
    pub name: String,
    pub marks: Vec<i64>,
    pub total: i64,
    pub percentage: f64,
    pub percentage_text: String,
    pub status: calc::Status,
    pub status_class: &'static str,
    pub remarks: calc::Remark,
    pub remarks_badge: &'static str,
}

pub fn table_rows(students: &[StudentRecord]) -> Vec<TableRow> {
    students
        .iter()
        .enumerate()
        .map(|(index, s)| TableRow {
            index,
            name: s.name.clone(),
            marks: s.marks.clone(),
            total: s.total,
            percentage: s.percentage,
            percentage_text: calc::format_percentage(s.percentage),
            status: s.status,
            status_class: s.status.css_class(),
            remarks: s.remarks,
            remarks_badge: s.remarks.badge(),
        })
        .collect()
}

/// Tabular document handed to the PDF renderer: one header row, one body row
/// per student, every cell already formatted as text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportModel {
    pub file_name: &'static str,
    pub head: Vec<Vec<String>>,
    pub body: Vec<Vec<String>>,
}

pub fn export_model(subjects: &[String], students: &[StudentRecord]) -> ExportModel {
    let mut head = Vec::with_capacity(subjects.len() + 1 + EXPORT_TRAILING.len());
    head.push(EXPORT_LEADING.to_string());
    head.extend(subjects.iter().cloned());
    head.extend(EXPORT_TRAILING.iter().map(|h| h.to_string()));

    let body = students
        .iter()
        .map(|s| {
            let mut row = Vec::with_capacity(s.marks.len() + 5);
            row.push(s.name.clone());
            row.extend(s.marks.iter().map(|m| m.to_string()));
            row.push(s.total.to_string());
            row.push(calc::format_percentage(s.percentage));
            row.push(s.status.as_str().to_string());
            row.push(s.remarks.label().to_string());
            row
        })
        .collect();

    ExportModel {
        file_name: EXPORT_FILE_NAME,
        head: vec![head],
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subjects() -> Vec<String> {
        vec!["Math".to_string(), "Science".to_string()]
    }

    #[test]
    fn headers_wrap_subjects_in_fixed_columns() {
        assert_eq!(
            column_headers(&subjects()),
            vec![
                "Student Name",
                "Math",
                "Science",
                "Total",
                "Percentage",
                "Status",
                "Remarks",
                "Actions"
            ]
        );
        assert_eq!(column_headers(&[]).len(), 6);
    }

    #[test]
    fn rows_carry_formatting_and_styling() {
        let students = vec![
            StudentRecord::new("Alice".into(), vec![90, 80]),
            StudentRecord::new("Bob".into(), vec![20, 41]),
        ];
        let rows = table_rows(&students);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].percentage_text, "85.00%");
        assert_eq!(rows[0].status_class, "pass");
        assert_eq!(rows[0].remarks_badge, "🎉");
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].percentage_text, "30.50%");
        assert_eq!(rows[1].status_class, "fail");

        let json = serde_json::to_value(&rows[1]).expect("serialize");
        assert_eq!(json["statusClass"], "fail");
        assert_eq!(json["remarks"], "Fail");
    }

    #[test]
    fn export_has_no_actions_column_and_text_cells() {
        let students = vec![StudentRecord::new("Alice".into(), vec![90, 80])];
        let model = export_model(&subjects(), &students);
        assert_eq!(model.file_name, "Student_Results.pdf");
        assert_eq!(
            model.head,
            vec![vec![
                "Name", "Math", "Science", "Total", "Percentage", "Status", "Remarks"
            ]]
        );
        assert_eq!(
            model.body,
            vec![vec!["Alice", "90", "80", "170", "85.00%", "Pass", "Excellent"]]
        );
    }
}
