use crate::condition;
use crate::console::Console;
use crate::environment::Environment;
use crate::error::LsiError;
use crate::segmenter::StatementGroup;
use crate::statement::{Statement, WhileLoop};
use crate::value::{parse_int_literal, Value};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Shown in place of a value when a name is unbound.
pub const KEY_NOT_FOUND: &str = "Key not found";

/// Limit on `call` re-dispatching into further calls.
const MAX_CALL_DEPTH: usize = 32;

#[derive(Debug, Clone)]
pub struct Options {
    /// Emit `Executing:` and handler trace lines.
    pub trace: bool,
    /// Upper bound on the iterations of any single `while` loop.
    pub max_loop_iterations: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            trace: true,
            max_loop_iterations: None,
        }
    }
}

/// Result of executing one line of a group.
#[derive(Debug, Clone)]
pub struct LineOutcome {
    pub line: String,
    pub number: usize,
    pub result: Result<(), LsiError>,
}

/// Per-line results for one statement group, in execution order.
#[derive(Debug, Clone, Default)]
pub struct GroupReport {
    pub outcomes: Vec<LineOutcome>,
}

impl GroupReport {
    pub fn errors(&self) -> impl Iterator<Item = &LsiError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Executes statement groups against one environment.
pub struct Dispatcher<R, W> {
    environment: Environment,
    console: Console<R, W>,
    options: Options,
    call_depth: usize,
}

impl Dispatcher<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(options: Options) -> Self {
        Self::new(Console::stdio(), options)
    }
}

impl<R: BufRead, W: Write> Dispatcher<R, W> {
    pub fn new(console: Console<R, W>, options: Options) -> Self {
        Self {
            environment: Environment::new(),
            console,
            options,
            call_depth: 0,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Runs every line of `group` in order. A failing line is reported and
    /// recorded; the lines after it still run.
    pub fn execute_group(&mut self, group: &StatementGroup) -> GroupReport {
        let mut report = GroupReport::default();

        for line in &group.lines {
            self.trace(format_args!("Executing: {}", line.text));
            let result = self
                .execute_line(&line.text)
                .map_err(|err| err.with_span(&line.span));

            if let Err(ref err) = result {
                debug!(line = line.number, kind = ?err.kind, "statement failed");
                self.console
                    .emit(format_args!("Error executing line '{}': {}", line.text, err));
            }

            report.outcomes.push(LineOutcome {
                line: line.text.clone(),
                number: line.number,
                result,
            });
        }

        report
    }

    /// Classifies and runs a single line.
    pub fn execute_line(&mut self, line: &str) -> Result<(), LsiError> {
        self.trace(format_args!("Executing line handler: {}", line));
        let statement = Statement::classify(line);
        debug!(?statement, "dispatching");

        match statement {
            Statement::Assign { name, value } => {
                self.trace_handler("Assignment statement handler", line);
                self.assign(&name, &value)
            }
            Statement::Def { name, params } => {
                self.trace_handler("Function definition handler", line);
                self.environment.define_function(&name, params);
                Ok(())
            }
            Statement::Call { name, args } => self.call(&name, &args),
            Statement::Input { name } => {
                let text = self.prompt(&name)?;
                self.environment.set(&name, Value::from_input(&text));
                Ok(())
            }
            Statement::InputStr { name } => {
                let text = self.prompt(&name)?;
                self.console
                    .emit(format_args!("String: {} = {}", name, text));
                self.environment.set(&name, Value::Str(text));
                Ok(())
            }
            Statement::Mult { left, right, dest } => {
                self.trace_handler("Multiplication statement handler", line);
                self.mult(&left, &right, &dest)
            }
            Statement::Repeat => Err(LsiError::unsupported("repeat")),
            Statement::WriteL { name } => {
                let shown = self.lookup_or(&name, KEY_NOT_FOUND);
                self.console.emit(format_args!("result:  {}", shown));
                Ok(())
            }
            Statement::Reverse { name } => {
                self.trace_handler("Write statement handler", line);
                self.reverse(&name)
            }
            Statement::Write { words } => {
                self.trace_handler("Write statement handler", line);
                self.console.emit(words.join(" "));
                Ok(())
            }
            Statement::While(header) => {
                self.trace_handler("While statement handler", line);
                self.run_while(&header)
            }
            Statement::Lookup { name } => {
                let shown = self.lookup_or(&name, &format!("Undefined variable '{}'", name));
                self.console.emit(shown);
                Ok(())
            }
            Statement::Malformed(keyword) => {
                self.console.emit(format_args!(
                    "Invalid '{}' statement format",
                    keyword.as_str()
                ));
                Ok(())
            }
            Statement::Ignored => Ok(()),
        }
    }

    fn assign(&mut self, name: &str, value: &str) -> Result<(), LsiError> {
        let value = match parse_int_literal(value) {
            Some(n) => Value::Int(n),
            None => self.environment.get(value).cloned().ok_or_else(|| {
                LsiError::assignment_error(format!(
                    "Invalid assignment: {} is not a valid value",
                    value
                ))
                .with_help("assign an integer literal or the name of a bound variable")
            })?,
        };
        self.environment.set(name, value);
        Ok(())
    }

    /// `call` checks the declared arity, then re-dispatches the rendered
    /// call text. No function body exists to run.
    fn call(&mut self, name: &str, args: &[String]) -> Result<(), LsiError> {
        let expected = self
            .environment
            .function_params(name)
            .map(<[String]>::len)
            .ok_or_else(|| LsiError::call_error(format!("Function '{}' is not defined.", name)))?;

        if args.len() != expected {
            return Err(LsiError::call_error(format!(
                "Function '{}' expects {} arguments.",
                name, expected
            )));
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LsiError::call_error(format!(
                "Function '{}' exceeded the call depth of {}.",
                name, MAX_CALL_DEPTH
            )));
        }

        self.console
            .emit(format_args!("Calling function handler: {}", name));
        let call_text = format!("{}({})", name, args.join(", "));

        self.call_depth += 1;
        let result = self.execute_line(&call_text);
        self.call_depth -= 1;
        result
    }

    fn mult(&mut self, left: &str, right: &str, dest: &str) -> Result<(), LsiError> {
        let a = self.integer_operand(left)?;
        let b = self.integer_operand(right)?;
        let product = a.checked_mul(b).ok_or_else(|| {
            LsiError::arithmetic_error(format!("{} * {} overflows a 64-bit integer", a, b))
        })?;
        self.environment.set(dest, Value::Int(product));
        Ok(())
    }

    fn integer_operand(&self, name: &str) -> Result<i64, LsiError> {
        match self.environment.get(name) {
            None => Err(LsiError::arithmetic_error(format!(
                "'{}' is not defined",
                name
            ))),
            Some(value) => value.as_integer().ok_or_else(|| {
                LsiError::arithmetic_error(format!("'{}' is not numeric: {}", name, value))
            }),
        }
    }

    fn reverse(&mut self, name: &str) -> Result<(), LsiError> {
        match self.environment.get(name) {
            Some(Value::Str(s)) => {
                let reversed: String = s.chars().rev().collect();
                self.console.emit(reversed);
                Ok(())
            }
            Some(other) => Err(LsiError::type_error(format!(
                "'{}' holds an {} and cannot be reversed",
                name,
                other.type_name()
            ))),
            None => Err(LsiError::type_error(format!(
                "'{}' is not defined and cannot be reversed",
                name
            ))),
        }
    }

    fn run_while(&mut self, header: &WhileLoop) -> Result<(), LsiError> {
        let mut iterations: u64 = 0;

        while condition::evaluate(
            &self.environment,
            &header.condition,
            &header.control,
            &header.bound,
        ) {
            if let Some(limit) = self.options.max_loop_iterations {
                if iterations >= limit {
                    return Err(LsiError::loop_limit(limit));
                }
            }
            iterations += 1;

            let shown = self.lookup_or(&header.report, KEY_NOT_FOUND);
            self.console.emit(shown);
            self.advance(header)?;
        }

        debug!(iterations, control = %header.control, "loop exited");
        Ok(())
    }

    fn advance(&mut self, header: &WhileLoop) -> Result<(), LsiError> {
        let step = parse_int_literal(&header.step).ok_or_else(|| {
            LsiError::arithmetic_error(format!("invalid loop step '{}'", header.step))
        })?;
        let current = match self.environment.get(&header.control) {
            None => 0,
            Some(Value::Int(n)) => *n,
            Some(Value::Str(_)) => {
                return Err(LsiError::type_error(format!(
                    "loop variable '{}' holds a string and cannot be incremented",
                    header.control
                )))
            }
        };
        let next = current.checked_add(step).ok_or_else(|| {
            LsiError::arithmetic_error(format!(
                "loop variable '{}' overflowed",
                header.control
            ))
        })?;
        self.environment.set(&header.control, Value::Int(next));
        Ok(())
    }

    fn prompt(&mut self, name: &str) -> Result<String, LsiError> {
        self.console
            .read_line(&format!("Enter value for {}: ", name))
            .map_err(LsiError::input_error)
    }

    fn lookup_or(&self, name: &str, fallback: &str) -> String {
        self.environment
            .get(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }

    fn trace(&mut self, line: impl std::fmt::Display) {
        if self.options.trace {
            self.console.emit(line);
        }
    }

    fn trace_handler(&mut self, label: &str, line: &str) {
        if self.options.trace {
            self.console
                .emit(format_args!("{}: {}", label, token_list(line)));
        }
    }
}

/// Renders a line's tokens as a quoted list: `['write', 'hello']`.
fn token_list(line: &str) -> String {
    let quoted: Vec<String> = line
        .split_whitespace()
        .map(|token| {
            let token = token.replace('\\', "\\\\");
            if token.contains('\'') && !token.contains('"') {
                format!("\"{}\"", token)
            } else {
                format!("'{}'", token.replace('\'', "\\'"))
            }
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::segmenter::segment;
    use pretty_assertions::assert_eq;

    fn quiet() -> Options {
        Options {
            trace: false,
            max_loop_iterations: Some(1_000),
        }
    }

    fn run(source: &str, input: &'static str) -> (Dispatcher<&'static [u8], Vec<u8>>, Vec<GroupReport>) {
        let mut d = Dispatcher::new(Console::new(input.as_bytes(), Vec::new()), quiet());
        let reports = segment(source)
            .unwrap()
            .iter()
            .map(|group| d.execute_group(group))
            .collect();
        (d, reports)
    }

    fn output(d: Dispatcher<&[u8], Vec<u8>>) -> String {
        String::from_utf8(d.into_console().into_output()).unwrap()
    }

    #[test]
    fn mult_binds_product() {
        let (d, reports) = run("assign a 5\nassign b 3\nmult a b c", "");
        assert_eq!(d.environment().get("c"), Some(&Value::Int(15)));
        assert!(reports.iter().all(GroupReport::is_clean));
    }

    #[test]
    fn assign_copies_by_value() {
        let (d, _) = run("assign x 1\nassign y x\nassign x 2", "");
        assert_eq!(d.environment().get("y"), Some(&Value::Int(1)));
        assert_eq!(d.environment().get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn failing_line_does_not_stop_group() {
        let (d, reports) = run("assign a nope\n  write still here\n  assign b 4", "");
        let report = &reports[0];
        assert_eq!(report.outcomes.len(), 3);
        let err = report.outcomes[0].result.as_ref().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Assignment);
        assert!(err.span.is_some());
        assert!(report.outcomes[1].result.is_ok());
        assert_eq!(d.environment().get("b"), Some(&Value::Int(4)));
        assert_eq!(
            output(d),
            "Error executing line 'assign a nope': Invalid assignment: nope is not a valid value\nstill here\n"
        );
    }

    #[test]
    fn mult_rejects_unbound_and_text() {
        let (d, reports) = run("assign a 2\ninputStr s\nmult a s c\nmult a z c", "abc\n");
        let kinds: Vec<ErrorKind> = reports.iter().flat_map(|r| r.errors().map(|e| e.kind)).collect();
        assert_eq!(kinds, vec![ErrorKind::Arithmetic, ErrorKind::Arithmetic]);
        assert!(d.environment().get("c").is_none());
    }

    #[test]
    fn input_reads_numbers_and_strings() {
        let (d, _) = run("input n\ninput w\ninputStr s", "42\nhi there\n7\n");
        assert_eq!(d.environment().get("n"), Some(&Value::Int(42)));
        assert_eq!(d.environment().get("w"), Some(&Value::Str("hi there".to_string())));
        assert_eq!(d.environment().get("s"), Some(&Value::Str("7".to_string())));
        assert_eq!(
            output(d),
            "Enter value for n: Enter value for w: Enter value for s: String: s = 7\n"
        );
    }

    #[test]
    fn while_counts_up_to_bound() {
        let (d, _) = run("assign i 0\nassign n 3\nwhile i < n 1 i", "");
        assert_eq!(output(d), "0\n1\n2\n");
    }

    #[test]
    fn while_false_at_entry_runs_nothing() {
        let (d, reports) = run("assign i 5\nassign n 3\nwhile i < n 1 i", "");
        assert!(reports.iter().all(GroupReport::is_clean));
        assert_eq!(output(d), "");
    }

    #[test]
    fn while_respects_iteration_cap() {
        let (d, reports) = run("assign n 3\nwhile i < n 0 i", "");
        let err = reports[1].errors().next().unwrap();
        assert_eq!(err.kind, ErrorKind::LoopLimit);
        assert_eq!(d.environment().get("i"), Some(&Value::Int(0)));
    }

    #[test]
    fn while_bad_step_reports_after_first_body() {
        let (d, reports) = run("assign n 3\nwhile i < n x n", "");
        assert_eq!(reports[1].errors().next().unwrap().kind, ErrorKind::Arithmetic);
        assert!(output(d).starts_with("3\n"));
    }

    #[test]
    fn reverse_and_lookup() {
        let (d, reports) = run("inputStr s\nreverse s\nassign k 3\nreverse k\ns\nzz", "abc\n");
        assert_eq!(reports[3].errors().next().unwrap().kind, ErrorKind::Type);
        let out = output(d);
        assert!(out.contains("cba\n"));
        assert!(out.ends_with("abc\nUndefined variable 'zz'\n"));
    }

    #[test]
    fn call_checks_arity_and_is_otherwise_inert() {
        let (d, reports) = run("def add a b\ncall add 1\ncall add 1 2\ncall nothing", "");
        let kinds: Vec<ErrorKind> = reports.iter().flat_map(|r| r.errors().map(|e| e.kind)).collect();
        assert_eq!(kinds, vec![ErrorKind::Call, ErrorKind::Call]);
        assert!(output(d).contains("Calling function handler: add\n"));
    }

    #[test]
    fn trace_lines_precede_results() {
        let mut d = Dispatcher::new(Console::new(&b""[..], Vec::new()), Options::default());
        for group in segment("def f a\ncall f 1\nwrite hello world\nreverse q\nwriteL q").unwrap() {
            d.execute_group(&group);
        }
        assert_eq!(
            output(d),
            "Executing: def f a\n\
             Executing line handler: def f a\n\
             Function definition handler: ['def', 'f', 'a']\n\
             Executing: call f 1\n\
             Executing line handler: call f 1\n\
             Calling function handler: f\n\
             Executing line handler: f(1)\n\
             Executing: write hello world\n\
             Executing line handler: write hello world\n\
             Write statement handler: ['write', 'hello', 'world']\n\
             hello world\n\
             Executing: reverse q\n\
             Executing line handler: reverse q\n\
             Write statement handler: ['reverse', 'q']\n\
             Error executing line 'reverse q': 'q' is not defined and cannot be reversed\n\
             Executing: writeL q\n\
             Executing line handler: writeL q\n\
             result:  Key not found\n"
        );
    }

    #[test]
    fn token_lists_use_single_quotes() {
        assert_eq!(token_list("write  a b"), "['write', 'a', 'b']");
        assert_eq!(token_list("write it's"), "['write', \"it's\"]");
        assert_eq!(token_list("write 'x\""), "['write', '\\'x\"']");
        assert_eq!(token_list("write a\\b"), "['write', 'a\\\\b']");
    }

    #[test]
    fn input_at_end_of_stream_fails() {
        let (d, reports) = run("input n\nn", "");
        let err = reports[0].errors().next().unwrap();
        assert_eq!(err.kind, ErrorKind::Input);
        assert!(d.environment().get("n").is_none());
        assert_eq!(
            output(d),
            "Enter value for n: Error executing line 'input n': failed to read input: end of input\n\
             Undefined variable 'n'\n"
        );
    }

    #[test]
    fn chained_calls_stop_at_depth_limit() {
        // Every function name starts with `call`, so each rendered call
        // text classifies as another call. Register each level's arity.
        let names: Vec<String> = (0..80).map(|i| format!("callf{}", i)).collect();
        let mut text = format!("call {}", names.join(" "));
        let call_line = text.clone();
        let mut d = Dispatcher::new(Console::new(&b""[..], Vec::new()), quiet());

        let mut levels = 0;
        while let Statement::Call { name, args } = Statement::classify(&text) {
            let params: Vec<String> = (0..args.len()).map(|i| format!("p{}", i)).collect();
            d.execute_line(&format!("def {} {}", name, params.join(" "))).unwrap();
            text = format!("{}({})", name, args.join(", "));
            levels += 1;
        }
        assert!(levels > MAX_CALL_DEPTH);

        let err = d.execute_line(&call_line).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Call);
        assert!(err.message.contains("exceeded the call depth of 32"));
        assert_eq!(d.call_depth, 0);
        let out = output(d);
        assert_eq!(out.matches("Calling function handler:").count(), MAX_CALL_DEPTH);
    }
}
