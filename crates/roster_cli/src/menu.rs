//! Interactive menu loop.
//!
//! # Responsibility
//! - Render the numbered menu and roster listing.
//! - Turn prompt answers into `RecordFields` / `RecordPatch` values.
//! - Convert user-facing 1-based numbers into 0-based indices.
//!
//! # Invariants
//! - Every service error is printed as `Error: {message}`; the loop keeps
//!   running.
//! - End of input behaves like choosing Quit.

use log::info;
use roster_core::{
    parse_team_size, Record, RecordFields, RecordPatch, RecordService, RecordStore,
};
use std::io::{self, BufRead, Write};

const MENU: &str = "\nEmployee Management Menu\n\
1. List Employees\n\
2. Add Employee\n\
3. Edit Employee\n\
4. Delete Employee\n\
5. Quit";

/// Prompt-driven front end over a `RecordService`.
pub struct Menu<S: RecordStore, R: BufRead, W: Write> {
    service: RecordService<S>,
    input: R,
    output: W,
}

impl<S: RecordStore, R: BufRead, W: Write> Menu<S, R, W> {
    pub fn new(service: RecordService<S>, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Runs until Quit or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        match self.run_loop() {
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                info!("event=menu_exit module=cli status=ok reason=eof");
                Ok(())
            }
            other => other,
        }
    }

    fn run_loop(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "{MENU}")?;
            let choice = self.prompt("Select an option (1-5): ")?;
            match choice.trim() {
                "1" => self.show_employees()?,
                "2" => self.add_employee()?,
                "3" => self.edit_employee()?,
                "4" => self.delete_employee()?,
                "5" => {
                    writeln!(self.output, "Goodbye!")?;
                    info!("event=menu_exit module=cli status=ok reason=quit");
                    return Ok(());
                }
                _ => writeln!(
                    self.output,
                    "Invalid option. Please enter a number from 1 to 5."
                )?,
            }
        }
    }

    fn show_employees(&mut self) -> io::Result<()> {
        if self.service.is_empty() {
            return writeln!(self.output, "No employees to display.");
        }
        for (number, record) in self.service.list().iter().enumerate() {
            writeln!(self.output, "{}. {}", number + 1, record)?;
        }
        Ok(())
    }

    fn add_employee(&mut self) -> io::Result<()> {
        let fields = match self.prompt_new_employee()? {
            Ok(fields) => fields,
            Err(message) => return self.show_error(&message),
        };
        match self.service.create(fields) {
            Ok(_) => writeln!(self.output, "Employee added."),
            Err(err) => self.show_error(&err.to_string()),
        }
    }

    fn edit_employee(&mut self) -> io::Result<()> {
        let Some(index) = self.select_employee("edit")? else {
            return Ok(());
        };
        let Some(existing) = self.service.get(index).cloned() else {
            return Ok(());
        };
        let patch = match self.prompt_edit_employee(&existing)? {
            Ok(patch) => patch,
            Err(message) => return self.show_error(&message),
        };
        match self.service.edit(index, &patch) {
            Ok(_) => writeln!(self.output, "Employee updated."),
            Err(err) => self.show_error(&err.to_string()),
        }
    }

    fn delete_employee(&mut self) -> io::Result<()> {
        let Some(index) = self.select_employee("delete")? else {
            return Ok(());
        };
        match self.service.delete(index) {
            Ok(_) => writeln!(self.output, "Employee deleted."),
            Err(err) => self.show_error(&err.to_string()),
        }
    }

    /// Lists the roster and asks for a 1-based number. `None` means the
    /// roster was empty or the answer was rejected (already reported).
    fn select_employee(&mut self, action: &str) -> io::Result<Option<usize>> {
        self.show_employees()?;
        let len = self.service.len();
        if len == 0 {
            return Ok(None);
        }
        let answer = self.prompt(&format!("Enter employee number to {action} (1-{len}): "))?;
        match parse_position(&answer, len) {
            Ok(index) => Ok(Some(index)),
            Err(message) => {
                self.show_error(message)?;
                Ok(None)
            }
        }
    }

    fn prompt_new_employee(&mut self) -> io::Result<Result<RecordFields, String>> {
        let id = self.prompt("ID: ")?;
        let first_name = self.prompt("First Name: ")?;
        let last_name = self.prompt("Last Name: ")?;
        let department = self.prompt("Department (3 uppercase letters): ")?;
        let phone_number = self.prompt("Phone Number (10 digits or formatted): ")?;
        let is_manager = self.prompt("Is this a manager? (y/n): ")?;

        let team_size = if is_manager.trim().eq_ignore_ascii_case("y") {
            let text = self.prompt("Team Size: ")?;
            match parse_team_size(&text) {
                Ok(size) => Some(i64::from(size)),
                Err(err) => return Ok(Err(err.to_string())),
            }
        } else {
            None
        };

        Ok(Ok(RecordFields {
            id,
            first_name,
            last_name,
            department,
            phone_number,
            team_size,
        }))
    }

    /// Blank answers keep the current value.
    fn prompt_edit_employee(
        &mut self,
        existing: &Record,
    ) -> io::Result<Result<RecordPatch, String>> {
        writeln!(self.output, "Leave blank to keep current value.")?;
        let first_name = self.prompt(&format!("First Name [{}]: ", existing.first_name()))?;
        let last_name = self.prompt(&format!("Last Name [{}]: ", existing.last_name()))?;
        let department = self.prompt(&format!("Department [{}]: ", existing.department()))?;
        let phone_number = self.prompt(&format!(
            "Phone Number [{}]: ",
            existing.phone_number_formatted()
        ))?;
        let mut patch = RecordPatch {
            first_name: non_blank(first_name),
            last_name: non_blank(last_name),
            department: non_blank(department),
            phone_number: non_blank(phone_number),
            team_size: None,
        };

        if let Some(current) = existing.team_size() {
            if let Some(text) = non_blank(self.prompt(&format!("Team Size [{current}]: "))?) {
                match parse_team_size(&text) {
                    Ok(size) => patch.team_size = Some(i64::from(size)),
                    Err(err) => return Ok(Err(err.to_string())),
                }
            }
        }

        Ok(Ok(patch))
    }

    fn show_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "Error: {message}")
    }

    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Converts a 1-based answer into a 0-based index below `len`.
pub fn parse_position(answer: &str, len: usize) -> Result<usize, &'static str> {
    let trimmed = answer.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err("Not a number.");
    }
    match trimmed.parse::<usize>() {
        Ok(number) if (1..=len).contains(&number) => Ok(number - 1),
        _ => Err("Number out of range."),
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_position, Menu};
    use roster_core::{CsvRecordStore, RecordService};
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    fn run_session(path: &Path, script: &str) -> String {
        let service = RecordService::open(CsvRecordStore::new(path)).unwrap();
        let mut output = Vec::new();
        let mut menu = Menu::new(service, Cursor::new(script.as_bytes()), &mut output);
        menu.run().unwrap();
        drop(menu);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn parse_position_converts_to_zero_based() {
        assert_eq!(parse_position("1", 3), Ok(0));
        assert_eq!(parse_position(" 3 ", 3), Ok(2));
        assert_eq!(parse_position("0", 3), Err("Number out of range."));
        assert_eq!(parse_position("4", 3), Err("Number out of range."));
        assert_eq!(parse_position("-1", 3), Err("Not a number."));
        assert_eq!(parse_position("two", 3), Err("Not a number."));
    }

    #[test]
    fn add_then_list_shows_display_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        let output = run_session(
            &path,
            "2\nE100\nJane\nDoe\nHRM\n(123) 456-7890\nn\n1\n5\n",
        );

        assert!(output.contains("Employee added."));
        assert!(output.contains("1. Employee[E100]: Jane Doe, Dept: HRM, Phone: (123)456-7890"));
        assert!(output.contains("Goodbye!"));
        let stored = fs::read_to_string(&path).unwrap();
        assert!(stored.contains("E100,Jane,Doe,HRM,1234567890,Employee,0"));
    }

    #[test]
    fn add_manager_prompts_for_team_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        run_session(&path, "2\nM1\nAl\nNg\nENG\n5551234567\ny\n4\n5\n");

        let stored = fs::read_to_string(&path).unwrap();
        assert!(stored.contains("M1,Al,Ng,ENG,5551234567,Manager,4"));
    }

    #[test]
    fn invalid_input_prints_error_and_keeps_looping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        let output = run_session(&path, "2\nE1\nJ4ne\nDoe\nHRM\n1234567890\nn\n9\n1\n");

        assert!(output.contains("Error: first name cannot contain digits"));
        assert!(output.contains("Invalid option. Please enter a number from 1 to 5."));
        assert!(output.contains("No employees to display."));
        assert!(!path.exists());
    }

    #[test]
    fn edit_keeps_blank_fields_and_delete_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        fs::write(
            &path,
            "id,fname,lname,department,phNumber,role,team_size\n\
             E1,Ann,Lee,OPS,5551234567,Employee,0\n\
             M1,Cy,Fox,ENG,5559876543,Manager,5\n",
        )
        .unwrap();

        let output = run_session(&path, "3\n2\n\nFoxx\n\n\n8\n4\n1\n5\n");

        assert!(output.contains("Employee updated."));
        assert!(output.contains("Employee deleted."));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "id,fname,lname,department,phNumber,role,team_size",
                "M1,Cy,Foxx,ENG,5559876543,Manager,8",
            ]
        );
    }

    #[test]
    fn out_of_range_selection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        fs::write(
            &path,
            "id,fname,lname,department,phNumber,role,team_size\n\
             E1,Ann,Lee,OPS,5551234567,Employee,0\n",
        )
        .unwrap();

        let output = run_session(&path, "4\n7\n");

        assert!(output.contains("Error: Number out of range."));
        assert!(fs::read_to_string(&path).unwrap().contains("E1,Ann"));
    }
}
