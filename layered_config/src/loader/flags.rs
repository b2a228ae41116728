//! Command-line flags.
//!
//! A [`clap::Command`] is assembled from the descriptor on every load: each
//! name hint of a field becomes its own `--long` flag and nested fields are
//! reached as `--parent.child`. Only values actually typed on the command line
//! are bound, so clap never injects anything that would shadow an earlier
//! source.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ffi::OsString;
use std::sync::OnceLock;

use async_trait::async_trait;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use super::Loader;
use crate::binder::{DefaultPolicy, bind};
use crate::context::Context;
use crate::descriptor::{Configurable, FieldKind, FieldRef, SourceKind};
use crate::error::{LoadError, LoadResult};
use crate::lookup::FlatLookup;
use crate::value::RawValue;

static PROCESS_ARGS: OnceLock<Vec<OsString>> = OnceLock::new();

/// Reads fields from command-line flags.
///
/// Booleans are switches (`--verbose`, or `--verbose=false`); lists accept
/// repetition (`--tag a --tag b`) or a comma list (`--tag a,b`). Flag names are
/// case-sensitive.
///
/// # Examples
///
/// ```
/// use layered_config::{Context, Flags, Layered, Loader};
///
/// #[derive(Debug, Default, Layered)]
/// struct Settings {
///     port: u16,
///     verbose: bool,
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let mut settings = Settings::default();
/// Flags::from_args(["svc", "--port", "8080", "--verbose"])
///     .load(&Context::background(), "svc", &mut settings)
///     .await?;
/// assert_eq!(settings.port, 8080);
/// assert!(settings.verbose);
/// # Ok::<(), layered_config::LoadError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Flags {
    args: Option<Vec<OsString>>,
}

impl Flags {
    /// Reads the process arguments, captured once per process.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `args` instead of the process arguments.
    ///
    /// The first item is the program name, as with [`std::env::args_os`].
    #[must_use]
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            args: Some(args.into_iter().map(Into::into).collect()),
        }
    }

    fn args(&self) -> &[OsString] {
        self.args
            .as_deref()
            .unwrap_or_else(|| PROCESS_ARGS.get_or_init(|| std::env::args_os().collect()))
    }
}

/// Shape a flag accepts on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Switch,
    Single,
    Many,
}

impl Arity {
    const fn of(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Boolean => Self::Switch,
            FieldKind::StringList => Self::Many,
            _ => Self::Single,
        }
    }
}

fn validate(name: &str) -> LoadResult<()> {
    let reason = if name.starts_with('-') {
        "names must not start with '-'"
    } else if name.contains('=') {
        "names must not contain '='"
    } else if name.chars().any(char::is_whitespace) {
        "names must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(LoadError::InvalidFlag {
        name: name.to_owned(),
        reason: reason.to_owned(),
    })
}

fn join(prefixes: &[String], name: &str) -> Vec<String> {
    if prefixes.is_empty() {
        return vec![name.to_owned()];
    }
    prefixes
        .iter()
        .map(|prefix| format!("{prefix}.{name}"))
        .collect()
}

/// Collects every flag name the descriptor of `target` produces.
fn collect(
    target: &dyn Configurable,
    prefixes: &[String],
    flags: &mut HashMap<String, Arity>,
    order: &mut Vec<String>,
) -> LoadResult<()> {
    let descriptor = target.descriptor();
    for (index, field) in descriptor.fields.iter().enumerate() {
        let names: Vec<String> = field
            .hints_for(SourceKind::Flags)
            .into_iter()
            .flat_map(|hint| join(prefixes, hint))
            .collect();
        match target.field(index) {
            Some(FieldRef::Nested(inner)) => collect(inner, &names, flags, order)?,
            Some(FieldRef::Value(_)) => {
                let arity = Arity::of(field.kind);
                for name in names.into_iter().filter(|name| name != "help") {
                    validate(&name)?;
                    match flags.entry(name) {
                        Entry::Vacant(slot) => {
                            order.push(slot.key().clone());
                            slot.insert(arity);
                        }
                        Entry::Occupied(slot) if *slot.get() != arity => {
                            return Err(LoadError::InvalidFlag {
                                name: slot.key().clone(),
                                reason: String::from(
                                    "shared by fields that take different kinds of values",
                                ),
                            });
                        }
                        Entry::Occupied(_) => {}
                    }
                }
            }
            None => {}
        }
    }
    Ok(())
}

fn arg_for(name: &str, arity: Arity) -> Arg {
    let arg = Arg::new(name.to_owned())
        .long(name.to_owned())
        .value_parser(clap::value_parser!(String));
    match arity {
        Arity::Switch => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        Arity::Single => arg.action(ArgAction::Set).num_args(1),
        Arity::Many => arg.action(ArgAction::Append).num_args(1),
    }
}

fn command_for(app_name: &str, flags: &HashMap<String, Arity>, order: &[String]) -> Command {
    order
        .iter()
        .filter_map(|name| flags.get(name).map(|arity| arg_for(name, *arity)))
        .fold(
            Command::new(app_name.to_owned()).args_override_self(true),
            Command::arg,
        )
}

fn typed_value(matches: &ArgMatches, flags: &HashMap<String, Arity>, name: &str) -> Option<RawValue> {
    let arity = flags.get(name)?;
    if matches.value_source(name) != Some(ValueSource::CommandLine) {
        return None;
    }
    let mut values: Vec<String> = matches.get_many::<String>(name)?.cloned().collect();
    match arity {
        Arity::Many if values.len() > 1 => Some(RawValue::List(values)),
        _ => values.pop().map(RawValue::Scalar),
    }
}

#[async_trait]
impl Loader for Flags {
    fn name(&self) -> &'static str {
        "flags"
    }

    async fn load(
        &self,
        _ctx: &Context,
        app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()> {
        let mut flags = HashMap::new();
        let mut order = Vec::new();
        collect(target, &[], &mut flags, &mut order)?;
        let matches = command_for(app_name, &flags, &order).try_get_matches_from(self.args())?;
        let probe = |name: &str| typed_value(&matches, &flags, name);
        let lookup = FlatLookup::new(SourceKind::Flags, ".", &probe);
        bind(target, &lookup, DefaultPolicy::Skip).map(drop)
    }
}
