//! Line-oriented `winnow` grammar for session scripts.
//!
//! Each line holds at most one command, optionally followed by a `#` comment.
//! The parser only checks syntax; alias binding is checked afterwards by
//! [`Script::parse`](super::Script::parse).

use winnow::{
    Parser as _,
    ascii::{float, line_ending, space0, space1},
    combinator::{alt, cut_err, delimited, eof, opt, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use skilltree_core::geometry::{Point, Size};

use super::{Alias, Command, ScriptError, Span, Statement};

/// Diagnostic attached to winnow errors via `.context()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Expected {
    message: &'static str,
    label: &'static str,
    help: Option<&'static str>,
    /// When set, the error span runs from here to the error position.
    start: Option<usize>,
}

type Input<'a> = LocatingSlice<&'a str>;
type PResult<O> = ModalResult<O, ContextError<Expected>>;

const CANVAS_USAGE: Expected = Expected {
    message: "invalid `canvas` command",
    label: "expected a width and a height",
    help: Some("usage: canvas <width> <height>"),
    start: None,
};

const NODE_USAGE: Expected = Expected {
    message: "invalid `node` command",
    label: "unexpected input here",
    help: Some("usage: node <alias> \"<title>\" [under <alias>] [at <x> <y>]"),
    start: None,
};

const REMOVE_USAGE: Expected = Expected {
    message: "invalid `remove` command",
    label: "expected an alias",
    help: Some("usage: remove <alias>"),
    start: None,
};

const SELECT_USAGE: Expected = Expected {
    message: "invalid `select` command",
    label: "expected an alias or `none`",
    help: Some("usage: select <alias> | select none"),
    start: None,
};

const DRAG_USAGE: Expected = Expected {
    message: "invalid `drag` command",
    label: "unexpected input here",
    help: Some("usage: drag <alias> to <x> <y>"),
    start: None,
};

const RENAME_USAGE: Expected = Expected {
    message: "invalid `rename` command",
    label: "unexpected input here",
    help: Some("usage: rename <alias> \"<title>\""),
    start: None,
};

const UNKNOWN_COMMAND: Expected = Expected {
    message: "unknown command",
    label: "not a command",
    help: Some("commands: canvas, node, remove, select, drag, rename, layout"),
    start: None,
};

const UNTERMINATED_TITLE: Expected = Expected {
    message: "unterminated title",
    label: "title ends here",
    help: Some("close the title with `\"` on the same line"),
    start: None,
};

const INVALID_ESCAPE: Expected = Expected {
    message: "invalid escape sequence",
    label: "unknown escape",
    help: Some("titles support `\\\"` and `\\\\`"),
    start: None,
};

const TRAILING_INPUT: Expected = Expected {
    message: "unexpected input",
    label: "expected end of line",
    help: Some("each line holds one command, optionally followed by a `#` comment"),
    start: None,
};

/// Alias characters: ASCII letters, digits, `_` and `-`.
fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .parse_next(input)
}

fn alias(input: &mut Input<'_>) -> PResult<Alias> {
    identifier
        .with_span()
        .map(|(name, range)| Alias::new(name, Span::new(range)))
        .parse_next(input)
}

/// A finite decimal number.
fn number(input: &mut Input<'_>) -> PResult<f32> {
    float
        .verify(|value: &f32| value.is_finite())
        .parse_next(input)
}

fn point(input: &mut Input<'_>) -> PResult<Point> {
    (number, space1, number)
        .map(|(x, _, y)| Point::new(x, y))
        .parse_next(input)
}

/// A double-quoted title with `\"` and `\\` escapes.
fn title(input: &mut Input<'_>) -> PResult<String> {
    let escape = preceded('\\', cut_err(one_of(['"', '\\'])).context(INVALID_ESCAPE));
    let content = repeat(0.., alt((escape, none_of(['"', '\\', '\n', '\r'])))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    preceded('"', cut_err(terminated(content, '"')).context(UNTERMINATED_TITLE))
        .parse_next(input)
}

fn comment<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    preceded('#', take_while(0.., |c| c != '\n')).parse_next(input)
}

fn canvas_args(input: &mut Input<'_>) -> PResult<Command> {
    (space1, number, space1, number)
        .map(|(_, width, _, height)| Command::Canvas {
            size: Size::new(width, height),
        })
        .parse_next(input)
}

fn node_args(input: &mut Input<'_>) -> PResult<Command> {
    (
        preceded(space1, alias),
        preceded(space1, title),
        opt(preceded((space1, literal("under"), space1), cut_err(alias))),
        opt(preceded((space1, literal("at"), space1), cut_err(point))),
    )
        .map(|(alias, title, parent, position)| Command::Node {
            alias,
            title,
            parent,
            position,
        })
        .parse_next(input)
}

fn drag_args(input: &mut Input<'_>) -> PResult<Command> {
    (
        preceded(space1, alias),
        preceded((space1, literal("to"), space1), point),
    )
        .map(|(alias, to)| Command::Drag { alias, to })
        .parse_next(input)
}

fn rename_args(input: &mut Input<'_>) -> PResult<Command> {
    (preceded(space1, alias), preceded(space1, title))
        .map(|(alias, title)| Command::Rename { alias, title })
        .parse_next(input)
}

fn command(input: &mut Input<'_>) -> PResult<Command> {
    let start = input.current_token_start();
    let word = identifier.parse_next(input)?;

    match word {
        "canvas" => cut_err(canvas_args).context(CANVAS_USAGE).parse_next(input),
        "node" => cut_err(node_args).context(NODE_USAGE).parse_next(input),
        "remove" => cut_err(preceded(space1, alias))
            .map(|alias| Command::Remove { alias })
            .context(REMOVE_USAGE)
            .parse_next(input),
        "select" => cut_err(preceded(space1, alias))
            .map(|alias| Command::Select {
                alias: (alias.name() != "none").then_some(alias),
            })
            .context(SELECT_USAGE)
            .parse_next(input),
        "drag" => cut_err(drag_args).context(DRAG_USAGE).parse_next(input),
        "rename" => cut_err(rename_args).context(RENAME_USAGE).parse_next(input),
        "layout" => Ok(Command::Layout),
        _ => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            Expected {
                start: Some(start),
                ..UNKNOWN_COMMAND
            },
        ))),
    }
}

fn line(input: &mut Input<'_>) -> PResult<Option<Statement>> {
    delimited(
        space0,
        opt(command.with_span())
            .map(|parsed| parsed.map(|(command, range)| Statement::new(command, Span::new(range)))),
        cut_err((space0, opt(comment), alt((line_ending, eof)))).context(TRAILING_INPUT),
    )
    .parse_next(input)
}

/// Convert a winnow error at `error_pos` into a [`ScriptError`].
fn convert_error(err: ErrMode<ContextError<Expected>>, error_pos: usize, source: &str) -> ScriptError {
    let context = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    let expected = context.context().next().copied().unwrap_or(TRAILING_INPUT);
    let span = match expected.start {
        Some(start) => Span::new(start..error_pos),
        None => {
            let width = source
                .get(error_pos..)
                .and_then(|rest| rest.chars().next())
                .map_or(0, char::len_utf8);
            Span::new(error_pos..error_pos + width)
        }
    };

    let error = ScriptError::new(expected.message, span, expected.label);
    match expected.help {
        Some(help) => error.with_help(help),
        None => error,
    }
}

/// Parse `source` into statements, stopping at the first syntax error.
pub(super) fn parse_statements(source: &str) -> Result<Vec<Statement>, ScriptError> {
    let mut input = LocatingSlice::new(source);
    let mut statements = Vec::new();

    while !input.is_empty() {
        match line(&mut input) {
            Ok(Some(statement)) => statements.push(statement),
            Ok(None) => {}
            Err(err) => {
                let error_pos = input.current_token_start();
                return Err(convert_error(err, error_pos, source));
            }
        }
    }

    Ok(statements)
}
