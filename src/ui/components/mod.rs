pub mod code_editor;
pub mod history_list;
pub mod snippet_panel;
