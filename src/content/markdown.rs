//! Markdown/MDX rendering
//!
//! Rendering is split in two. [`MarkdownRenderer::compile`] parses a post
//! body into a [`CompiledContent`] tree when pages are generated, failing on
//! broken component syntax. [`MarkdownRenderer::hydrate`] turns that tree into
//! HTML, handing code blocks and embedded components to the renderers
//! registered in a [`Components`] map.

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

use super::highlight::CodeHighlighter;
use crate::config::HighlightConfig;
use crate::helpers::html_escape;

lazy_static! {
    /// `<Name attr="v">`, `</Name>` or `<Name />`; components are capitalised.
    /// Quoted and braced values are matched whole, so they may hold `>`.
    static ref COMPONENT_TAG: Regex =
        Regex::new(r#"<(/?)([A-Z][A-Za-z0-9_.]*)((?:\s+(?:"[^"]*"|'[^']*'|\{[^{}]*\}|[^<>"'{}/]|/[^<>])*)?)\s*(/?)>"#)
            .expect("component tag pattern");
    /// Anything that starts like a component tag
    static ref COMPONENT_START: Regex = Regex::new(r"</?[A-Z]").expect("component start pattern");
    /// `name`, `name="v"`, `name='v'` or `name={v}`
    static ref PROP: Regex = Regex::new(
        r#"([A-Za-z_][A-Za-z0-9_-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|\{([^{}]*)\}))?"#
    )
    .expect("prop pattern");
}

/// Rendering failures. Either one aborts the page of the post it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("invalid MDX at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("no renderer registered for component <{0}>")]
    UnknownComponent(String),
}

/// A node of compiled content
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Markup produced by the default markdown rules
    Html(String),
    /// A fenced or indented code block
    CodeBlock { lang: Option<String>, code: String },
    /// A component embedded in the document
    Component {
        name: String,
        props: BTreeMap<String, String>,
        children: Vec<Node>,
    },
}

/// Render-ready form of a post body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledContent {
    nodes: Vec<Node>,
}

impl CompiledContent {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Kinds of content element that can be mapped to a custom renderer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    CodeBlock,
    Component(String),
}

/// An element handed to an [`ElementRenderer`]
#[derive(Debug)]
pub enum Element<'a> {
    CodeBlock {
        lang: Option<&'a str>,
        code: &'a str,
    },
    Component {
        name: &'a str,
        props: &'a BTreeMap<String, String>,
        /// Already rendered children
        children: &'a str,
    },
}

/// Renders one kind of element to HTML
pub trait ElementRenderer: Send + Sync {
    fn render(&self, element: &Element<'_>) -> String;
}

impl<F> ElementRenderer for F
where
    F: Fn(&Element<'_>) -> String + Send + Sync,
{
    fn render(&self, element: &Element<'_>) -> String {
        self(element)
    }
}

/// Mapping from element kind to renderer, passed to [`MarkdownRenderer::hydrate`]
///
/// Kinds without an entry use the default markdown rules; components
/// without an entry are an error.
#[derive(Clone, Default)]
pub struct Components {
    renderers: HashMap<ElementKind, Arc<dyn ElementRenderer>>,
}

impl Components {
    /// An empty mapping: plain markdown output, no components
    pub fn new() -> Self {
        Self::default()
    }

    /// The blog's mapping: fenced code goes through the highlighter
    pub fn standard(config: &HighlightConfig) -> Self {
        Self::new().with(ElementKind::CodeBlock, CodeHighlighter::from_config(config))
    }

    /// Register a renderer for an element kind, replacing any previous one
    pub fn with<R>(mut self, kind: ElementKind, renderer: R) -> Self
    where
        R: ElementRenderer + 'static,
    {
        self.renderers.insert(kind, Arc::new(renderer));
        self
    }

    /// Register a renderer for the component `<name>`
    pub fn with_component<R>(self, name: &str, renderer: R) -> Self
    where
        R: ElementRenderer + 'static,
    {
        self.with(ElementKind::Component(name.to_string()), renderer)
    }

    pub fn get(&self, kind: &ElementKind) -> Option<&dyn ElementRenderer> {
        self.renderers.get(kind).map(|r| r.as_ref())
    }
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.renderers.keys()).finish()
    }
}

/// Markdown renderer
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        // Front-matter is stripped before rendering, so no YAML metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        Self { options }
    }

    /// Parse a post body into its render-ready tree
    pub fn compile(&self, source: &str) -> Result<CompiledContent, RenderError> {
        let lines = LineIndex::new(source);
        let mut builder = TreeBuilder::default();
        let mut footnotes = FootnoteNumbers::default();
        let mut code_block: Option<(Option<String>, String)> = None;
        // Source span of consecutive text events
        let mut text_run: Option<Range<usize>> = None;

        for (event, range) in Parser::new_ext(source, self.options).into_offset_iter() {
            if code_block.is_some() || !matches!(event, Event::Text(_)) {
                if let Some(run) = text_run.take() {
                    check_text(source, run, &lines)?;
                }
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        builder.push_node(Node::CodeBlock { lang, code });
                    }
                }
                Event::Text(text) => match code_block.as_mut() {
                    Some((_, code)) => code.push_str(&text),
                    None => {
                        text_run = Some(match text_run.take() {
                            Some(run) => run.start..range.end,
                            None => range,
                        });
                        builder.pending.push(Event::Text(text));
                    }
                },
                Event::FootnoteReference(name) => {
                    let number = footnotes.number(&name);
                    builder.pending.push(Event::InlineHtml(CowStr::from(format!(
                        "<sup class=\"footnote-reference\"><a href=\"#{}\">{}</a></sup>",
                        html_escape(&name),
                        number
                    ))));
                }
                Event::Start(Tag::FootnoteDefinition(name)) => {
                    let number = footnotes.number(&name);
                    builder.pending.push(Event::Html(CowStr::from(format!(
                        "<div class=\"footnote-definition\" id=\"{}\"><sup class=\"footnote-definition-label\">{}</sup>",
                        html_escape(&name),
                        number
                    ))));
                }
                Event::End(TagEnd::FootnoteDefinition) => {
                    builder.pending.push(Event::Html(CowStr::from("</div>\n")));
                }
                Event::Html(raw) => builder.markup(&raw, lines.line_of(range.start), false)?,
                Event::InlineHtml(raw) => builder.markup(&raw, lines.line_of(range.start), true)?,
                other => builder.pending.push(other),
            }
        }

        if let Some(run) = text_run {
            check_text(source, run, &lines)?;
        }

        builder.finish()
    }

    /// Turn compiled content into HTML
    pub fn hydrate(
        &self,
        content: &CompiledContent,
        components: &Components,
    ) -> Result<String, RenderError> {
        let mut output = String::new();
        hydrate_nodes(&content.nodes, components, &mut output)?;
        Ok(output)
    }

    /// Compile and hydrate in one go
    pub fn render(&self, source: &str, components: &Components) -> Result<String, RenderError> {
        let compiled = self.compile(source)?;
        self.hydrate(&compiled, components)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn hydrate_nodes(
    nodes: &[Node],
    components: &Components,
    output: &mut String,
) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            Node::Html(html) => output.push_str(html),
            Node::CodeBlock { lang, code } => {
                let element = Element::CodeBlock {
                    lang: lang.as_deref(),
                    code,
                };
                match components.get(&ElementKind::CodeBlock) {
                    Some(renderer) => output.push_str(&renderer.render(&element)),
                    None => output.push_str(&plain_code_block(lang.as_deref(), code)),
                }
            }
            Node::Component {
                name,
                props,
                children,
            } => {
                let renderer = components
                    .get(&ElementKind::Component(name.clone()))
                    .ok_or_else(|| RenderError::UnknownComponent(name.clone()))?;

                let mut inner = String::new();
                hydrate_nodes(children, components, &mut inner)?;
                output.push_str(&renderer.render(&Element::Component {
                    name,
                    props,
                    children: &inner,
                }));
            }
        }
    }
    Ok(())
}

/// Markdown text may not hold the start of a component tag that never
/// became one, unless the `<` is escaped
fn check_text(source: &str, run: Range<usize>, lines: &LineIndex) -> Result<(), RenderError> {
    for tag in COMPONENT_START.find_iter(&source[run.clone()]) {
        let at = run.start + tag.start();
        if source[..at].ends_with('\\') {
            continue;
        }

        let snippet: String = source[at..run.end]
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect();
        return Err(RenderError::Syntax {
            line: lines.line_of(at),
            message: format!("malformed component tag `{}`", snippet),
        });
    }
    Ok(())
}

/// Default markdown rendering of a code block
fn plain_code_block(lang: Option<&str>, code: &str) -> String {
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            html_escape(lang),
            html_escape(code)
        ),
        None => format!("<pre><code>{}</code></pre>\n", html_escape(code)),
    }
}

/// Footnote labels, numbered by first appearance across the whole document
///
/// Markup is split into several chunks, so the numbering cannot be left to
/// the per-chunk HTML writer.
#[derive(Default)]
struct FootnoteNumbers {
    numbers: HashMap<String, usize>,
}

impl FootnoteNumbers {
    fn number(&mut self, name: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(name.to_string()).or_insert(next)
    }
}

/// Byte offset -> 1-based line number
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// An open component waiting for its closing tag
struct Frame {
    name: String,
    props: BTreeMap<String, String>,
    line: usize,
    children: Vec<Node>,
}

/// Collects markdown events into nodes, nesting them under open components
#[derive(Default)]
struct TreeBuilder<'a> {
    pending: Vec<Event<'a>>,
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl<'a> TreeBuilder<'a> {
    fn current(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    /// Render buffered events with the default rules
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut markup = String::new();
        html::push_html(&mut markup, self.pending.drain(..));
        if !markup.is_empty() {
            self.current().push(Node::Html(markup));
        }
    }

    fn push_node(&mut self, node: Node) {
        self.flush();
        self.current().push(node);
    }

    /// Split raw HTML into plain markup and component tags
    fn markup(&mut self, raw: &str, line: usize, inline: bool) -> Result<(), RenderError> {
        let mut last = 0;

        for caps in COMPONENT_TAG.captures_iter(raw) {
            let Some(tag) = caps.get(0) else { continue };
            let tag_line = line + raw[..tag.start()].matches('\n').count();

            let segment_line = line + raw[..last].matches('\n').count();
            self.raw_html(&raw[last..tag.start()], segment_line, inline)?;
            last = tag.end();

            let closing = &caps[1] == "/";
            let name = caps[2].to_string();
            let attrs = &caps[3];
            let self_closing = &caps[4] == "/";

            if closing {
                if self_closing || !attrs.trim().is_empty() {
                    return Err(RenderError::Syntax {
                        line: tag_line,
                        message: format!("malformed closing tag `{}`", tag.as_str()),
                    });
                }
                self.close(&name, tag_line)?;
                continue;
            }

            let props = parse_props(attrs, tag_line)?;
            if self_closing {
                self.push_node(Node::Component {
                    name,
                    props,
                    children: Vec::new(),
                });
            } else {
                self.flush();
                self.stack.push(Frame {
                    name,
                    props,
                    line: tag_line,
                    children: Vec::new(),
                });
            }
        }

        self.raw_html(&raw[last..], line + raw[..last].matches('\n').count(), inline)
    }

    /// Plain HTML passes through untouched; half a component tag is an error
    fn raw_html(&mut self, segment: &str, line: usize, inline: bool) -> Result<(), RenderError> {
        if segment.is_empty() {
            return Ok(());
        }

        if let Some(m) = COMPONENT_START.find(segment) {
            let snippet: String = segment[m.start()..]
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(40)
                .collect();
            return Err(RenderError::Syntax {
                line: line + segment[..m.start()].matches('\n').count(),
                message: format!("malformed component tag `{}`", snippet),
            });
        }

        let owned = CowStr::from(segment.to_string());
        self.pending.push(if inline {
            Event::InlineHtml(owned)
        } else {
            Event::Html(owned)
        });
        Ok(())
    }

    fn close(&mut self, name: &str, line: usize) -> Result<(), RenderError> {
        self.flush();
        match self.stack.pop() {
            Some(frame) if frame.name == name => {
                self.current().push(Node::Component {
                    name: frame.name,
                    props: frame.props,
                    children: frame.children,
                });
                Ok(())
            }
            Some(frame) => Err(RenderError::Syntax {
                line,
                message: format!(
                    "expected </{}> to close the tag opened on line {}, found </{}>",
                    frame.name, frame.line, name
                ),
            }),
            None => Err(RenderError::Syntax {
                line,
                message: format!("unexpected closing tag </{}>", name),
            }),
        }
    }

    fn finish(mut self) -> Result<CompiledContent, RenderError> {
        self.flush();
        if let Some(frame) = self.stack.last() {
            return Err(RenderError::Syntax {
                line: frame.line,
                message: format!("<{}> is never closed", frame.name),
            });
        }
        Ok(CompiledContent { nodes: self.root })
    }
}

/// Parse component attributes
fn parse_props(attrs: &str, line: usize) -> Result<BTreeMap<String, String>, RenderError> {
    let leftover = PROP.replace_all(attrs, "");
    if !leftover.trim().is_empty() {
        return Err(RenderError::Syntax {
            line,
            message: format!("malformed attributes `{}`", attrs.trim()),
        });
    }

    let props = PROP
        .captures_iter(attrs)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "true".to_string());
            (caps[1].to_string(), value)
        })
        .collect();
    Ok(props)
}
