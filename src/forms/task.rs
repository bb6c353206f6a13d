use chrono::NaiveDateTime;

use crate::db::{CreateTaskParams, TaskStatus};

use super::{Cleaner, FieldErrors, FieldSpec, Form, FormData};

const TASK_TYPE: FieldSpec = FieldSpec::text("task_type", "Task type").max_len(255);
const SUMMARY: FieldSpec = FieldSpec::text("summary", "Summary").textarea();
const START_TIME: FieldSpec = FieldSpec::datetime("start_time", "Start time");
const END_TIME: FieldSpec = FieldSpec::datetime("end_time", "End time");
const STATUS: FieldSpec = FieldSpec::choice("status", "Status", TaskStatus::CHOICES);

/// Task create form, shared by the plain and modal flows.
pub struct TaskForm;

#[derive(Debug, Clone)]
pub struct TaskInput {
    pub task_type: String,
    pub summary: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: TaskStatus,
}

impl From<TaskInput> for CreateTaskParams {
    fn from(input: TaskInput) -> Self {
        Self {
            task_type: input.task_type,
            summary: input.summary,
            start_time: input.start_time,
            end_time: input.end_time,
            status: input.status,
        }
    }
}

impl Form for TaskForm {
    type Output = TaskInput;

    const FIELDS: &'static [FieldSpec] = &[TASK_TYPE, SUMMARY, START_TIME, END_TIME, STATUS];

    fn clean(data: &FormData) -> Result<TaskInput, FieldErrors> {
        let mut cleaner = Cleaner::new(data);
        let task_type = cleaner.text(&TASK_TYPE);
        let summary = cleaner.text(&SUMMARY);
        let start_time = cleaner.datetime(&START_TIME);
        let end_time = cleaner.datetime(&END_TIME);
        let status = cleaner.choice(&STATUS, TaskStatus::from_db_value);
        let errors = cleaner.finish();

        match (task_type, summary, start_time, end_time, status) {
            (Some(task_type), Some(summary), Some(start_time), Some(end_time), Some(status))
                if errors.is_empty() =>
            {
                Ok(TaskInput {
                    task_type,
                    summary,
                    start_time,
                    end_time,
                    status,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED_MESSAGE;

    #[test]
    fn valid_task_parses_browser_datetimes() {
        let data: FormData = [
            ("task_type", "Filing"),
            ("summary", "File the motion"),
            ("start_time", "2025-04-01T09:00"),
            ("end_time", "2025-04-02 17:30:00"),
            ("status", "in_progress"),
        ]
        .into_iter()
        .collect();

        let input = TaskForm::clean(&data).expect("valid");
        assert_eq!(input.status, TaskStatus::InProgress);
        assert_eq!(input.start_time.to_string(), "2025-04-01 09:00:00");
        assert_eq!(input.end_time.to_string(), "2025-04-02 17:30:00");
    }

    #[test]
    fn blank_status_and_bad_times_are_reported() {
        let data: FormData = [
            ("task_type", "Filing"),
            ("summary", "File the motion"),
            ("start_time", "tomorrow"),
            ("end_time", ""),
        ]
        .into_iter()
        .collect();

        let errors = TaskForm::clean(&data).expect_err("invalid");
        assert_eq!(errors.get("start_time"), ["Enter a valid date/time.".to_string()]);
        assert!(errors.has("end_time"));
        assert_eq!(errors.get("status"), [REQUIRED_MESSAGE]);
    }
}
