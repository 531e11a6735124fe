//! UI locators keyed by semantic field name
//!
//! One immutable table, injected into the driver at construction. Values are
//! Playwright selector strings (css, xpath, or text engine). The defaults
//! target the OrangeHRM demo UI; a different deployment swaps the table, not
//! the driver.

/// Locator table for the login screen and the employee management area.
#[derive(Debug, Clone)]
pub struct Locators {
    pub username_input: String,
    pub password_input: String,
    pub login_submit: String,

    pub pim_menu: String,
    pub add_action: String,
    pub employee_list_menu: String,

    pub search_input: String,
    pub search_submit: String,
    /// Submit control of the add/edit forms.
    pub form_submit: String,
    /// One entry per row in the search result table.
    pub result_row: String,
    pub edit_action: String,
    pub delete_action: String,
    pub confirm_delete: String,

    pub employee_id_input: String,
    pub first_name_input: String,
    pub last_name_input: String,

    pub job_tab: String,
    pub job_title_select: String,
    /// Rendered entries of an open select control.
    pub select_options: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            username_input: r#"[name="username"]"#.into(),
            password_input: r#"[name="password"]"#.into(),
            login_submit: r#"button[type="submit"]"#.into(),

            pim_menu: "text=PIM".into(),
            add_action: "text=Add".into(),
            employee_list_menu: "text=Employee List".into(),

            search_input: "(//input[contains(@class,'oxd-input oxd-input')])[2]".into(),
            search_submit: r#"button[type="submit"]"#.into(),
            form_submit: r#"button[type="submit"]"#.into(),
            result_row: ".oxd-table-card".into(),
            edit_action: "(//i[@class='oxd-icon bi-pencil-fill'])[1]".into(),
            delete_action: "i.bi-trash".into(),
            confirm_delete: "text=Yes, Delete".into(),

            employee_id_input: "(//input[contains(@class,'oxd-input oxd-input')])[5]".into(),
            first_name_input: r#"[name="firstName"]"#.into(),
            last_name_input: r#"[name="lastName"]"#.into(),

            job_tab: "text=Job".into(),
            job_title_select: r#"//div[contains(@class, "oxd-select")]"#.into(),
            select_options: r#".oxd-select-dropdown [role="option"]"#.into(),
        }
    }
}

/// Selector matching an element whose visible text equals `text` exactly.
pub fn exact_text(text: &str) -> String {
    format!("text=\"{}\"", text.replace('"', "\\\""))
}

/// Selector for the input immediately following a label containing `label`.
pub fn labeled_input(label: &str) -> String {
    format!(r#"//label[contains(text(), "{}")]/following::input[1]"#, label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let locators = Locators::default();
        for (name, value) in [
            ("username_input", &locators.username_input),
            ("password_input", &locators.password_input),
            ("login_submit", &locators.login_submit),
            ("pim_menu", &locators.pim_menu),
            ("add_action", &locators.add_action),
            ("employee_list_menu", &locators.employee_list_menu),
            ("search_input", &locators.search_input),
            ("search_submit", &locators.search_submit),
            ("form_submit", &locators.form_submit),
            ("result_row", &locators.result_row),
            ("edit_action", &locators.edit_action),
            ("delete_action", &locators.delete_action),
            ("confirm_delete", &locators.confirm_delete),
            ("employee_id_input", &locators.employee_id_input),
            ("first_name_input", &locators.first_name_input),
            ("last_name_input", &locators.last_name_input),
            ("job_tab", &locators.job_tab),
            ("job_title_select", &locators.job_title_select),
            ("select_options", &locators.select_options),
        ] {
            assert!(!value.is_empty(), "{} is empty", name);
        }
    }

    #[test]
    fn exact_text_quotes_the_needle() {
        assert_eq!(exact_text("QA Engineer"), r#"text="QA Engineer""#);
    }

    #[test]
    fn exact_text_escapes_embedded_quotes() {
        assert_eq!(exact_text(r#"Say "hi""#), r#"text="Say \"hi\"""#);
    }

    #[test]
    fn labeled_input_targets_the_following_input() {
        let selector = labeled_input("Other Id");
        assert_eq!(
            selector,
            r#"//label[contains(text(), "Other Id")]/following::input[1]"#
        );
    }
}
