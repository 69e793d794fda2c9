//! Developer console.
//!
//! Executes raw command lines against the engine:
//! - console variables (cvars) with typed values
//! - built-in commands plus gameplay bindings for the active scene
//! - command history
//! - quoted-argument parsing
//!
//! # Usage
//! ```ignore
//! let mut console = Console::new();
//! console.exec("setGravity 0 9.8", Some(&mut scene))?;
//! console.exec("debug true", None)?;
//! ```

use std::collections::{HashMap, VecDeque};

use anyhow::{bail, Context};
use tempo_shared::math::Vec2;

use crate::scene::Scene;

/// Console variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl CvarValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CvarValue::Float(v) => Some(*v),
            CvarValue::Int(v) => Some(*v as f64),
            CvarValue::String(s) => s.parse().ok(),
            CvarValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        }
    }

    /// Parses a typed value from console text: int, float, bool, then string.
    fn parse(text: &str) -> Self {
        if let Ok(v) = text.parse::<i64>() {
            CvarValue::Int(v)
        } else if let Ok(v) = text.parse::<f64>() {
            CvarValue::Float(v)
        } else if text == "true" {
            CvarValue::Bool(true)
        } else if text == "false" {
            CvarValue::Bool(false)
        } else {
            CvarValue::String(text.trim_matches('"').to_string())
        }
    }
}

impl std::fmt::Display for CvarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CvarValue::String(v) => write!(f, "{v:?}"),
            CvarValue::Int(v) => v.fmt(f),
            CvarValue::Float(v) => v.fmt(f),
            CvarValue::Bool(v) => v.fmt(f),
        }
    }
}

/// Console variable metadata.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub name: String,
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
}

/// Command handler function type.
pub type CommandHandler =
    Box<dyn Fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Context passed to command handlers.
pub struct ConsoleContext<'a> {
    /// Output buffer for command responses.
    pub output: Vec<String>,
    cvars: &'a mut HashMap<String, Cvar>,
    scene: Option<&'a mut Scene>,
}

impl ConsoleContext<'_> {
    pub fn print(&mut self, msg: impl Into<String>) {
        self.output.push(msg.into());
    }

    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.get(name).map(|c| c.value.clone())
    }

    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        match self.cvars.get_mut(name) {
            Some(cvar) => {
                cvar.value = value;
                Ok(())
            }
            None => bail!("unknown cvar: {name}"),
        }
    }

    /// The active scene, if the engine has one.
    pub fn scene(&mut self) -> anyhow::Result<&mut Scene> {
        self.scene.as_deref_mut().context("no active scene")
    }

    fn physics(&mut self) -> anyhow::Result<&mut tempo_sim::PhysicsStepper> {
        self.scene()?
            .physics_mut()
            .context("physics system not in use (run usePhysicsSystem)")
    }
}

type Builtin = fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()>;

/// Commands every console starts with.
const BUILTINS: &[(&str, Builtin)] = &[
    ("echo", echo),
    ("help", help),
    ("cvarlist", cvarlist),
    ("set", set),
    ("usePhysicsSystem", use_physics_system),
    ("getGravity", get_gravity),
    ("setGravity", set_gravity),
    ("setGravityMult", set_gravity_mult),
    ("physicsBodyCount", physics_body_count),
];

const MAX_HISTORY: usize = 100;

fn echo(args: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    ctx.print(args.join(" "));
    Ok(())
}

fn help(_: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let names: Vec<&str> = BUILTINS.iter().map(|(name, _)| *name).collect();
    ctx.print(format!("Available commands: {}", names.join(", ")));
    Ok(())
}

fn cvarlist(_: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let mut cvars: Vec<&Cvar> = ctx.cvars.values().collect();
    cvars.sort_by(|a, b| a.name.cmp(&b.name));
    let lines: Vec<String> = cvars
        .into_iter()
        .map(|c| format!("  {} = {} (default: {}) - {}", c.name, c.value, c.default, c.description))
        .collect();
    ctx.output.extend(lines);
    Ok(())
}

fn set(args: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let [name, value @ ..] = args else {
        bail!("usage: set <cvar> <value>");
    };
    if value.is_empty() {
        bail!("usage: set <cvar> <value>");
    }
    let value = CvarValue::parse(&value.join(" "));
    let line = format!("{name} = {value}");
    ctx.set_cvar(name, value)?;
    ctx.print(line);
    Ok(())
}

fn use_physics_system(_: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    ctx.scene()?.use_physics_system();
    Ok(())
}

fn get_gravity(_: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let g = ctx.physics()?.gravity();
    ctx.print(format!("{} {}", g.x, g.y));
    Ok(())
}

fn parse_f32(what: &str, text: &str) -> anyhow::Result<f32> {
    text.parse().with_context(|| format!("bad {what}: {text}"))
}

fn set_gravity(args: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let [x, y] = args else {
        bail!("usage: setGravity <x> <y>");
    };
    let gravity = Vec2::new(parse_f32("x", x)?, parse_f32("y", y)?);
    ctx.physics()?.set_gravity(gravity);
    Ok(())
}

fn set_gravity_mult(args: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let [m] = args else {
        bail!("usage: setGravityMult <m>");
    };
    let m = parse_f32("multiplier", m)?;
    ctx.physics()?.set_gravity_multiplier(m);
    Ok(())
}

fn physics_body_count(_: &[&str], ctx: &mut ConsoleContext<'_>) -> anyhow::Result<()> {
    let n = ctx.physics()?.body_count();
    ctx.print(n.to_string());
    Ok(())
}

/// The console.
pub struct Console {
    cvars: HashMap<String, Cvar>,
    commands: HashMap<String, CommandHandler>,
    history: VecDeque<String>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let mut console = Self {
            cvars: HashMap::new(),
            commands: HashMap::new(),
            history: VecDeque::with_capacity(MAX_HISTORY),
        };
        console.register_cvar("debug", CvarValue::Bool(false), "Draw physics debug geometry");
        for &(name, builtin) in BUILTINS {
            console.register_command(name, builtin);
        }
        console
    }

    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str) {
        self.cvars.insert(
            name.to_string(),
            Cvar {
                name: name.to_string(),
                value: default.clone(),
                default,
                description: description.to_string(),
            },
        );
    }

    /// Adds or replaces a command.
    pub fn register_command<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.insert(name.to_string(), Box::new(handler));
    }

    /// Executes a console command line, optionally against a scene.
    ///
    /// A bare cvar name prints it; a cvar name followed by a value sets it.
    pub fn exec(&mut self, line: &str, scene: Option<&mut Scene>) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Vec::new());
        }
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(line.to_string());

        let tokens = tokenize(line);
        let Some((name, args)) = tokens.split_first() else {
            return Ok(Vec::new());
        };

        if let Some(handler) = self.commands.get(*name) {
            let mut ctx = ConsoleContext {
                output: Vec::new(),
                cvars: &mut self.cvars,
                scene,
            };
            handler(args, &mut ctx).with_context(|| format!("command '{name}'"))?;
            return Ok(ctx.output);
        }

        let Some(cvar) = self.cvars.get_mut(*name) else {
            return Ok(vec![format!("Unknown command: {name}")]);
        };
        let line = if args.is_empty() {
            format!("{} = {} (default: {})", cvar.name, cvar.value, cvar.default)
        } else {
            cvar.value = CvarValue::parse(&args.join(" "));
            format!("{} = {}", cvar.name, cvar.value)
        };
        Ok(vec![line])
    }

    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.get(name).map(|c| c.value.clone())
    }

    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        let cvar = self.cvars.get_mut(name).with_context(|| format!("unknown cvar: {name}"))?;
        cvar.value = value;
        Ok(())
    }

    /// Executed lines, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }
}

/// Splits a line on whitespace, keeping `"quoted text"` as one token.
/// Odd segments between quote marks are the quoted ones.
fn tokenize(line: &str) -> Vec<&str> {
    line.split('"')
        .enumerate()
        .flat_map(|(i, segment)| {
            if i % 2 == 1 {
                vec![segment]
            } else {
                segment.split_whitespace().collect()
            }
        })
        .filter(|token| !token.is_empty())
        .collect()
}
