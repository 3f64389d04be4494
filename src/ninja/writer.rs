//! Serializer for the Ninja build-plan text format: comments, bindings,
//! rules, build statements, and subfile inclusions (spec.md §4.1).

use std::fmt::Write as _;

use camino::Utf8Path;

/// A binding's right-hand side: either already executor-safe text (escaped
/// on write) or a Ninja expression like `$dir` that must reach the file
/// unescaped so the variable reference still works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Literal(String),
    Expression(String),
}

impl Value {
    pub fn literal(s: impl Into<String>) -> Self {
        Value::Literal(s.into())
    }

    pub fn expression(s: impl Into<String>) -> Self {
        Value::Expression(s.into())
    }
}

/// A single `name = value` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: Value,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Binding {
            name: name.into(),
            value,
        }
    }
}

/// Accumulates Ninja plan text and serializes it deterministically: output
/// order is exactly call order, with no implicit sorting or deduplication.
#[derive(Debug, Default)]
pub struct Writer {
    buffer: String,
}

impl Writer {
    pub fn new() -> Self {
        Writer::default()
    }

    /// Emits a `# ...` comment line. `text` must not itself contain a
    /// newline (callers pass single lines, matching spec.md's header
    /// comments).
    pub fn comment(&mut self, text: &str) {
        let _ = writeln!(self.buffer, "# {text}");
    }

    /// Emits a blank line, used to separate sections.
    pub fn newline(&mut self) {
        self.buffer.push('\n');
    }

    /// Emits a top-level `name = value` binding.
    pub fn binding(&mut self, name: &str, value: &Value) {
        let _ = write!(self.buffer, "{name} = ");
        self.write_value(value);
        self.buffer.push('\n');
    }

    /// Emits a `rule <name>` declaration followed by indented bindings.
    /// `bindings` order is preserved (e.g. `command` first, then
    /// `description`, `generator`, `pool`, `depfile`).
    pub fn rule(&mut self, name: &str, bindings: &[Binding]) {
        let _ = writeln!(self.buffer, "rule {name}");
        for binding in bindings {
            self.write_scoped_binding(binding);
        }
    }

    /// Emits a `build <outputs> : <rule> <inputs> | <input-deps> || <order-deps>`
    /// statement, omitting the `|` / `||` sections when empty, followed by
    /// an indented block of scoped `bindings`.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &mut self,
        outputs: &[Value],
        rule: &str,
        inputs: &[Value],
        input_dependencies: &[Value],
        order_dependencies: &[Value],
        bindings: &[Binding],
    ) {
        self.buffer.push_str("build ");
        self.write_path_list(outputs);
        let _ = write!(self.buffer, ": {rule}");
        if !inputs.is_empty() {
            self.buffer.push(' ');
            self.write_path_list(inputs);
        }
        if !input_dependencies.is_empty() {
            self.buffer.push_str(" | ");
            self.write_path_list(input_dependencies);
        }
        if !order_dependencies.is_empty() {
            self.buffer.push_str(" || ");
            self.write_path_list(order_dependencies);
        }
        self.buffer.push('\n');
        for binding in bindings {
            self.write_scoped_binding(binding);
        }
    }

    /// Emits `subninja <path>`, semantically inlining another plan file.
    pub fn subninja(&mut self, path: &Utf8Path) {
        let _ = writeln!(self.buffer, "subninja {}", escape_path(path.as_str()));
    }

    /// Consumes the writer, returning the accumulated plan text.
    pub fn finish(self) -> String {
        self.buffer
    }

    fn write_scoped_binding(&mut self, binding: &Binding) {
        let _ = write!(self.buffer, " {} = ", binding.name);
        self.write_value(&binding.value);
        self.buffer.push('\n');
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Expression(raw) => self.buffer.push_str(raw),
            Value::Literal(raw) => self.buffer.push_str(&escape_literal(raw)),
        }
    }

    fn write_path_list(&mut self, values: &[Value]) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.buffer.push(' ');
            }
            match value {
                Value::Expression(raw) => self.buffer.push_str(raw),
                Value::Literal(raw) => self.buffer.push_str(&escape_path(raw)),
            }
        }
    }
}

/// Escapes a literal binding value: `$` becomes `$$`, embedded newlines
/// become `$` followed by a real newline (a Ninja line continuation), and a
/// leading space is escaped so Ninja doesn't trim it.
fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    if raw.starts_with(' ') {
        out.push('$');
    }
    for ch in raw.chars() {
        match ch {
            '$' => out.push_str("$$"),
            '\n' => out.push_str("$\n"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes a path used in the outputs/inputs lists of a `build` statement:
/// `$`, `:` and spaces are meaningful to Ninja's path-list grammar there.
fn escape_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '$' => out.push_str("$$"),
            ':' => out.push_str("$:"),
            ' ' => out.push_str("$ "),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_escapes_dollar() {
        let mut w = Writer::new();
        w.binding("x", &Value::literal("$HOME"));
        assert_eq!(w.finish(), "x = $$HOME\n");
    }

    #[test]
    fn expression_value_passes_through() {
        let mut w = Writer::new();
        w.binding("x", &Value::expression("$dir"));
        assert_eq!(w.finish(), "x = $dir\n");
    }

    #[test]
    fn rule_and_build_statement() {
        let mut w = Writer::new();
        w.rule(
            "invoke",
            &[Binding::new("command", Value::expression("cd $dir && $exec"))],
        );
        w.build(
            &[Value::literal("/tmp/out.o")],
            "invoke",
            &[Value::literal("/tmp/in.c")],
            &[],
            &[Value::literal("begin-target-Foo")],
            &[Binding::new("description", Value::literal("Compiling"))],
        );
        let text = w.finish();
        assert_eq!(
            text,
            "rule invoke\n command = cd $dir && $exec\nbuild /tmp/out.o: invoke /tmp/in.c || begin-target-Foo\n description = Compiling\n"
        );
    }

    #[test]
    fn empty_dependency_sections_are_omitted() {
        let mut w = Writer::new();
        w.build(
            &[Value::literal("finish-target-Foo")],
            "phony",
            &[],
            &[],
            &[],
            &[],
        );
        assert_eq!(w.finish(), "build finish-target-Foo: phony\n");
    }

    #[test]
    fn path_with_space_is_escaped() {
        let mut w = Writer::new();
        w.build(
            &[Value::literal("/tmp/a b.o")],
            "phony",
            &[],
            &[],
            &[],
            &[],
        );
        assert_eq!(w.finish(), "build /tmp/a$ b.o: phony\n");
    }

    #[test]
    fn comment_and_subninja() {
        let mut w = Writer::new();
        w.comment("xcninja build plan");
        w.subninja(Utf8Path::new("/tmp/t/build.ninja"));
        assert_eq!(w.finish(), "# xcninja build plan\nsubninja /tmp/t/build.ninja\n");
    }
}
