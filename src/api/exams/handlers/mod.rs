mod cover;
mod manage;
mod questions;
mod sections;

pub(super) use cover::upload_cover;
pub(super) use manage::{
    create_exam, delete_exam, get_exam, list_exams, publish_exam, update_exam,
};
pub(super) use questions::{create_question, delete_question, list_questions, update_question};
pub(super) use sections::{create_section, delete_section, list_sections, update_section};
