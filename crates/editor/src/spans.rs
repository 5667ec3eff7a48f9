//! Inline Span Operations
//!
//! Offset-based editing of inline sequences: splitting, wrapping a range in
//! a style, stripping a style, and reading the styles under a range.
//! Offsets count characters; line breaks and images count as one.

use prodoc_core::tree::{inlines_text, normalize_inlines, Inline, InlineStyle, Link, SpanStyle};

/// Split an inline sequence at a character offset
pub fn split_inlines(inlines: Vec<Inline>, offset: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut remaining = offset;

    for inline in inlines {
        if remaining == 0 {
            right.push(inline);
            continue;
        }
        let len = inline.len();
        if len <= remaining {
            remaining -= len;
            left.push(inline);
            continue;
        }

        match inline {
            Inline::Text(text) => {
                let byte = text
                    .char_indices()
                    .nth(remaining)
                    .map(|(i, _)| i)
                    .unwrap_or(text.len());
                left.push(Inline::Text(text[..byte].to_string()));
                right.push(Inline::Text(text[byte..].to_string()));
            }
            Inline::Styled { style, children } => {
                let (l, r) = split_inlines(children, remaining);
                left.push(Inline::Styled { style: style.clone(), children: l });
                right.push(Inline::Styled { style, children: r });
            }
            Inline::Link(link) => {
                let (l, r) = split_inlines(link.children, remaining);
                left.push(Inline::Link(Link {
                    href: link.href.clone(),
                    new_tab: link.new_tab,
                    children: l,
                }));
                right.push(Inline::Link(Link {
                    href: link.href,
                    new_tab: link.new_tab,
                    children: r,
                }));
            }
            atomic => right.push(atomic),
        }
        remaining = 0;
    }

    (normalize_inlines(left), normalize_inlines(right))
}

/// Cut an inline sequence into the parts before, inside and after a range
pub fn slice_inlines(
    inlines: Vec<Inline>,
    start: usize,
    end: usize,
) -> (Vec<Inline>, Vec<Inline>, Vec<Inline>) {
    let (head, after) = split_inlines(inlines, end);
    let (before, middle) = split_inlines(head, start.min(end));
    (before, middle, after)
}

fn join(parts: [Vec<Inline>; 3]) -> Vec<Inline> {
    normalize_inlines(parts.into_iter().flatten().collect())
}

/// Wrap the characters in `start..end` with a style
pub fn wrap_range(inlines: Vec<Inline>, start: usize, end: usize, style: InlineStyle) -> Vec<Inline> {
    let (before, middle, after) = slice_inlines(inlines, start, end);
    if middle.is_empty() {
        return join([before, middle, after]);
    }
    join([before, vec![Inline::styled(style, middle)], after])
}

/// Remove every wrapper matching `pred` from the characters in `start..end`
pub fn unwrap_range(
    inlines: Vec<Inline>,
    start: usize,
    end: usize,
    pred: &dyn Fn(&InlineStyle) -> bool,
) -> Vec<Inline> {
    let (before, middle, after) = slice_inlines(inlines, start, end);
    join([before, strip_style(middle, pred), after])
}

/// Remove wrappers matching `pred`, keeping their children
pub fn strip_style(inlines: Vec<Inline>, pred: &dyn Fn(&InlineStyle) -> bool) -> Vec<Inline> {
    let mut out = Vec::new();
    for inline in inlines {
        match inline {
            Inline::Styled { style, children } => {
                let children = strip_style(children, pred);
                if pred(&style) {
                    out.extend(children);
                } else {
                    out.push(Inline::Styled { style, children });
                }
            }
            Inline::Link(mut link) => {
                link.children = strip_style(link.children, pred);
                out.push(Inline::Link(link));
            }
            other => out.push(other),
        }
    }
    normalize_inlines(out)
}

/// Apply span styling to `start..end`, overriding the same properties on
/// spans already inside the range
pub fn restyle_range(inlines: Vec<Inline>, start: usize, end: usize, span: SpanStyle) -> Vec<Inline> {
    let (before, middle, after) = slice_inlines(inlines, start, end);
    if middle.is_empty() {
        return join([before, middle, after]);
    }
    let middle = clear_span_properties(middle, &span);
    join([before, vec![Inline::styled(InlineStyle::Span(span), middle)], after])
}

fn clear_span_properties(inlines: Vec<Inline>, overriding: &SpanStyle) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Styled { style, children } => {
                let children = clear_span_properties(children, overriding);
                let style = match style {
                    InlineStyle::Span(mut inner) => {
                        if overriding.font_family.is_some() {
                            inner.font_family = None;
                        }
                        if overriding.size_class.is_some() || overriding.font_size_px.is_some() {
                            inner.size_class = None;
                            inner.font_size_px = None;
                        }
                        if overriding.color.is_some() {
                            inner.color = None;
                        }
                        if overriding.background.is_some() {
                            inner.background = None;
                        }
                        InlineStyle::Span(inner)
                    }
                    other => other,
                };
                out.push(Inline::Styled { style, children });
            }
            Inline::Link(mut link) => {
                link.children = clear_span_properties(link.children, overriding);
                out.push(Inline::Link(link));
            }
            other => out.push(other),
        }
    }
    normalize_inlines(out)
}

/// Insert inline content at an offset
pub fn insert_inlines(inlines: Vec<Inline>, offset: usize, content: Vec<Inline>) -> Vec<Inline> {
    let (before, after) = split_inlines(inlines, offset);
    join([before, content, after])
}

/// Delete the characters in `start..end`
pub fn delete_range(inlines: Vec<Inline>, start: usize, end: usize) -> Vec<Inline> {
    let (before, _, after) = slice_inlines(inlines, start, end);
    join([before, Vec::new(), after])
}

/// Visible text preceding an offset
pub fn text_before(inlines: &[Inline], offset: usize) -> String {
    let (before, _) = split_inlines(inlines.to_vec(), offset);
    inlines_text(&before)
}

/// A run of characters sharing the same wrappers
#[derive(Debug, Clone)]
struct Segment {
    start: usize,
    len: usize,
    styles: Vec<InlineStyle>,
}

fn segments(inlines: &[Inline]) -> Vec<Segment> {
    fn go(inlines: &[Inline], stack: &mut Vec<InlineStyle>, pos: &mut usize, out: &mut Vec<Segment>) {
        for inline in inlines {
            match inline {
                Inline::Styled { style, children } => {
                    stack.push(style.clone());
                    go(children, stack, pos, out);
                    stack.pop();
                }
                Inline::Link(link) => go(&link.children, stack, pos, out),
                other => {
                    let len = other.len();
                    if len > 0 {
                        out.push(Segment {
                            start: *pos,
                            len,
                            styles: stack.clone(),
                        });
                        *pos += len;
                    }
                }
            }
        }
    }

    let mut out = Vec::new();
    go(inlines, &mut Vec::new(), &mut 0, &mut out);
    out
}

/// Whether every character in `start..end` carries a matching wrapper.
///
/// A collapsed range looks at the character just before the caret.
pub fn range_has_style(
    inlines: &[Inline],
    start: usize,
    end: usize,
    pred: &dyn Fn(&InlineStyle) -> bool,
) -> bool {
    let (start, end) = if start == end {
        if start == 0 { (0, 1) } else { (start - 1, start) }
    } else {
        (start.min(end), start.max(end))
    };

    let covering: Vec<Segment> = segments(inlines)
        .into_iter()
        .filter(|seg| seg.start < end && seg.start + seg.len > start)
        .collect();

    !covering.is_empty() && covering.iter().all(|seg| seg.styles.iter().any(|s| pred(s)))
}

/// Index path to the hyperlink touching an offset
fn link_path(inlines: &[Inline], offset: usize) -> Option<Vec<usize>> {
    let mut start = 0;
    for (index, inline) in inlines.iter().enumerate() {
        let len = inline.len();
        let end = start + len;
        if start <= offset && offset <= end && len > 0 {
            match inline {
                Inline::Link(_) => return Some(vec![index]),
                Inline::Styled { children, .. } => {
                    if let Some(mut path) = link_path(children, offset - start) {
                        path.insert(0, index);
                        return Some(path);
                    }
                }
                _ => {}
            }
        }
        start = end;
    }
    None
}

/// Hyperlink enclosing the caret
pub fn link_at(inlines: &[Inline], offset: usize) -> Option<&Link> {
    let path = link_path(inlines, offset)?;
    let mut current = inlines;
    let (last, parents) = path.split_last()?;
    for index in parents {
        current = current.get(*index)?.children()?;
    }
    match current.get(*last)? {
        Inline::Link(link) => Some(link),
        _ => None,
    }
}

/// Mutable hyperlink enclosing the caret
pub fn link_at_mut(inlines: &mut [Inline], offset: usize) -> Option<&mut Link> {
    let path = link_path(inlines, offset)?;
    let (last, parents) = path.split_last()?;
    let mut current = inlines;
    for index in parents {
        current = match current.get_mut(*index)? {
            Inline::Styled { children, .. } => children.as_mut_slice(),
            _ => return None,
        };
    }
    match current.get_mut(*last)? {
        Inline::Link(link) => Some(link),
        _ => None,
    }
}

/// Replace span size-class markers with an explicit pixel size
pub fn resize_size_class(inlines: &mut [Inline], class: u8, px: u32) -> usize {
    let mut replaced = 0;
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Styled { style, children } => {
                if let InlineStyle::Span(span) = style {
                    if span.size_class == Some(class) {
                        span.size_class = None;
                        span.font_size_px = Some(px);
                        replaced += 1;
                    }
                }
                replaced += resize_size_class(children, class, px);
            }
            Inline::Link(link) => replaced += resize_size_class(&mut link.children, class, px),
            _ => {}
        }
    }
    replaced
}
