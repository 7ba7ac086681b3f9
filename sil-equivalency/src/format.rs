//! Value formatting for failure messages
//!
//! The engine only depends on [`ValueFormatter`]; [`DefaultFormatter`] is a
//! compact single-line renderer with depth and item limits so that cyclic
//! or very large graphs stay readable.

use std::fmt::Write;

use crate::value::Value;

/// Turns a value into display text
pub trait ValueFormatter: Send + Sync {
    fn format(&self, value: &Value) -> String;
}

/// Configuration for the default formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Nesting levels rendered before eliding with `…`
    pub max_depth: usize,

    /// Elements rendered per collection before eliding
    pub max_items: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_items: 8,
        }
    }
}

impl FormatterConfig {
    /// Render only the top level
    pub fn shallow() -> Self {
        Self {
            max_depth: 1,
            ..Default::default()
        }
    }
}

/// `<null>`, `"text"`, `{1, 2}`, `Customer { Name = "John" }`
#[derive(Debug, Clone, Default)]
pub struct DefaultFormatter {
    config: FormatterConfig,
}

impl DefaultFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    fn write_value(&self, out: &mut String, value: &Value, depth: usize) {
        match value {
            Value::Null => out.push_str("<null>"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::UInt(u) => {
                let _ = write!(out, "{u}");
            }
            Value::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            Value::Str(s) => {
                let _ = write!(out, "{s:?}");
            }
            Value::DateTime(dt) => {
                let _ = write!(out, "<{}>", dt.format("%Y-%m-%d %H:%M:%S%.f"));
            }
            Value::Bytes(bytes) => {
                self.write_items(out, bytes.iter(), depth, |out, b, _| {
                    let _ = write!(out, "0x{b:02X}");
                });
            }
            Value::Seq(items) => {
                self.write_items(out, items.iter(), depth, |out, item, d| {
                    self.write_value(out, item, d)
                });
            }
            Value::Map(entries) => {
                self.write_items(out, entries.iter(), depth, |out, (key, value), d| {
                    out.push('[');
                    self.write_value(out, key, d);
                    out.push_str("] = ");
                    self.write_value(out, value, d);
                });
            }
            Value::Object(obj) => {
                // Um ciclo ainda emprestado é mostrado só pelo tipo
                let Ok(record) = obj.try_borrow() else {
                    out.push_str("<object>");
                    return;
                };
                out.push_str(record.type_name());
                if record.is_empty() {
                    out.push_str(" { }");
                    return;
                }
                if depth >= self.config.max_depth {
                    out.push_str(" {…}");
                    return;
                }
                out.push_str(" { ");
                for (i, member) in record.members().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if i >= self.config.max_items {
                        out.push('…');
                        break;
                    }
                    out.push_str(&member.name);
                    out.push_str(" = ");
                    self.write_value(out, &member.value, depth + 1);
                }
                out.push_str(" }");
            }
            Value::Inaccessible(reason) => {
                let _ = write!(out, "<inaccessible: {reason}>");
            }
        }
    }

    fn write_items<'a, T: 'a>(
        &self,
        out: &mut String,
        items: impl ExactSizeIterator<Item = &'a T>,
        depth: usize,
        write_item: impl Fn(&mut String, &'a T, usize),
    ) {
        if items.len() == 0 {
            out.push_str("{empty}");
            return;
        }
        if depth >= self.config.max_depth {
            let _ = write!(out, "{{…{} item(s)}}", items.len());
            return;
        }
        out.push('{');
        for (i, item) in items.enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if i >= self.config.max_items {
                out.push('…');
                break;
            }
            write_item(out, item, depth + 1);
        }
        out.push('}');
    }
}

impl ValueFormatter for DefaultFormatter {
    fn format(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ObjectRef, Record};

    fn fmt(value: impl Into<Value>) -> String {
        DefaultFormatter::default().format(&value.into())
    }

    #[test]
    fn test_leaves() {
        assert_eq!(fmt(Value::Null), "<null>");
        assert_eq!(fmt(true), "true");
        assert_eq!(fmt(36), "36");
        assert_eq!(fmt(1.0), "1.0");
        assert_eq!(fmt("John"), "\"John\"");
    }

    #[test]
    fn test_collections() {
        assert_eq!(fmt(Value::seq([1, 2, 3])), "{1, 2, 3}");
        assert_eq!(fmt(Value::bytes(vec![1u8, 255])), "{0x01, 0xFF}");
        assert_eq!(fmt(Value::seq(Vec::<i32>::new())), "{empty}");
        assert_eq!(fmt(Value::map([("a", 1)])), "{[\"a\"] = 1}");
    }

    #[test]
    fn test_item_limit() {
        let formatter = DefaultFormatter::new(FormatterConfig {
            max_items: 2,
            ..Default::default()
        });
        assert_eq!(formatter.format(&Value::seq([1, 2, 3])), "{1, 2, …}");
    }

    #[test]
    fn test_record() {
        let value = Value::from(Record::new("Customer").with("Name", "John").with("Age", 36));
        assert_eq!(fmt(value), "Customer { Name = \"John\", Age = 36 }");
    }

    #[test]
    fn test_cyclic_record_is_bounded() {
        let node = ObjectRef::new(Record::new("Node").with("Id", 1));
        node.set("Next", &node);
        let text = fmt(&node);
        assert!(text.starts_with("Node { Id = 1, Next = Node {"));
        assert!(text.contains("{…}"));
    }

    #[test]
    fn test_shallow() {
        let formatter = DefaultFormatter::new(FormatterConfig::shallow());
        let value = Value::from(Record::new("Outer").with("Inner", Record::new("Inner").with("X", 1)));
        assert_eq!(formatter.format(&value), "Outer { Inner = Inner {…} }");
    }
}
