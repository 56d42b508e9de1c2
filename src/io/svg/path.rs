//! Path data and transform lists
//!
//! Path data is reduced to straight runs: line commands keep every vertex and
//! curve commands step straight to their end point.

use nalgebra::{Matrix3, Vector3};
use nom::character::complete::one_of;
use nom::number::complete::double;

use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathToken {
    Command(char),
    Number(f64),
}

const PATH_COMMANDS: &str = "MmLlHhVvZzCcSsQqTtAa";

type NomError<'a> = nom::error::Error<&'a str>;

fn path_tokens(d: &str) -> Vec<PathToken> {
    let mut tokens = Vec::new();
    let mut input = d;
    loop {
        input = input.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if input.is_empty() {
            break;
        }
        if let Ok((rest, c)) = one_of::<_, _, NomError<'_>>(PATH_COMMANDS)(input) {
            tokens.push(PathToken::Command(c));
            input = rest;
            continue;
        }
        match double::<_, NomError<'_>>(input) {
            Ok((rest, v)) if v.is_finite() && rest.len() < input.len() => {
                tokens.push(PathToken::Number(v));
                input = rest;
            }
            _ => {
                // stray character
                let mut chars = input.chars();
                chars.next();
                input = chars.as_str();
            }
        }
    }
    tokens
}

/// Numbers consumed by one repetition of a command
fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'H' | 'V' => 1,
        'M' | 'L' | 'T' => 2,
        'S' | 'Q' => 4,
        'C' => 6,
        'A' => 7,
        _ => 0,
    }
}

/// Gap below which `Z` adds no closing segment
const CLOSE_TOLERANCE: f64 = 0.01;

/// Straight runs of a path; every `M` starts a new run
pub(crate) fn path_runs(d: &str) -> Vec<Vec<Point>> {
    let tokens = path_tokens(d);
    let mut runs = Vec::new();
    let mut run: Vec<Point> = Vec::new();
    let mut current = Point::ZERO;
    let mut start = Point::ZERO;
    let mut command: Option<char> = None;
    let mut i = 0;

    while i < tokens.len() {
        let c = match tokens[i] {
            PathToken::Command(c) => {
                i += 1;
                if c == 'Z' || c == 'z' {
                    if !run.is_empty() && current.distance(&start) > CLOSE_TOLERANCE {
                        run.push(start);
                    }
                    current = start;
                    command = None;
                } else {
                    command = Some(c);
                }
                continue;
            }
            PathToken::Number(_) => match command {
                Some(c) => c,
                None => {
                    i += 1;
                    continue;
                }
            },
        };

        let n = arity(c);
        let args: Vec<f64> = tokens[i..]
            .iter()
            .take(n)
            .map_while(|t| match t {
                PathToken::Number(v) => Some(*v),
                PathToken::Command(_) => None,
            })
            .collect();
        if args.len() < n {
            // incomplete argument list, drop it
            i += args.len().max(1);
            continue;
        }
        i += n;

        let relative = c.is_ascii_lowercase();
        let upper = c.to_ascii_uppercase();
        let target = match upper {
            'H' => Point::new(if relative { current.x + args[0] } else { args[0] }, current.y),
            'V' => Point::new(current.x, if relative { current.y + args[0] } else { args[0] }),
            _ => {
                let end = Point::new(args[n - 2], args[n - 1]);
                if relative {
                    current + end
                } else {
                    end
                }
            }
        };

        if upper == 'M' {
            if run.len() >= 2 {
                runs.push(std::mem::take(&mut run));
            } else {
                run.clear();
            }
            run.push(target);
            start = target;
            // coordinates after a move are implicit line-tos
            command = Some(if relative { 'l' } else { 'L' });
        } else {
            if run.is_empty() {
                run.push(current);
            }
            run.push(target);
        }
        current = target;
    }

    if run.len() >= 2 {
        runs.push(run);
    }
    runs
}

fn numbers(args: &str) -> Vec<f64> {
    args.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Parse a transform list into one affine matrix
///
/// `None` when the list cannot be read; an empty list is the identity.
pub(crate) fn parse_transform(value: &str) -> Option<Matrix3<f64>> {
    let mut matrix = Matrix3::identity();
    let mut rest = value.trim();
    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = rest[open..].find(')')? + open;
        let name = rest[..open].trim().trim_start_matches(',').trim();
        let args = numbers(&rest[open + 1..close]);
        matrix *= transform_function(name, &args)?;
        rest = rest[close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }
    Some(matrix)
}

fn transform_function(name: &str, args: &[f64]) -> Option<Matrix3<f64>> {
    let m = match (name, args) {
        ("matrix", [a, b, c, d, e, f]) => Matrix3::new(*a, *c, *e, *b, *d, *f, 0.0, 0.0, 1.0),
        ("translate", [tx]) => Matrix3::new_translation(&nalgebra::Vector2::new(*tx, 0.0)),
        ("translate", [tx, ty]) => Matrix3::new_translation(&nalgebra::Vector2::new(*tx, *ty)),
        ("scale", [s]) => Matrix3::new_nonuniform_scaling(&nalgebra::Vector2::new(*s, *s)),
        ("scale", [sx, sy]) => Matrix3::new_nonuniform_scaling(&nalgebra::Vector2::new(*sx, *sy)),
        ("rotate", [deg]) => Matrix3::new_rotation(deg.to_radians()),
        ("rotate", [deg, cx, cy]) => {
            let to = Matrix3::new_translation(&nalgebra::Vector2::new(*cx, *cy));
            let back = Matrix3::new_translation(&nalgebra::Vector2::new(-cx, -cy));
            to * Matrix3::new_rotation(deg.to_radians()) * back
        }
        ("skewX", [deg]) => Matrix3::new(1.0, deg.to_radians().tan(), 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
        ("skewY", [deg]) => Matrix3::new(1.0, 0.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0, 0.0, 1.0),
        _ => return None,
    };
    Some(m)
}

pub(crate) fn apply(matrix: &Matrix3<f64>, p: Point) -> Point {
    let v = matrix * Vector3::new(p.x, p.y, 1.0);
    Point::new(v.x, v.y)
}

/// Rotation of the transformed x axis, degrees
pub(crate) fn rotation_degrees(matrix: &Matrix3<f64>) -> f64 {
    matrix[(1, 0)].atan2(matrix[(0, 0)]).to_degrees()
}
