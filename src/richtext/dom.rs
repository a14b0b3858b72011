//! Arena-backed markup tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Detaching a
//! node never frees its slot, so an id captured before a rewrite still names
//! the same node afterwards (or a detached one). The editor relies on this to
//! find "the text node the caret was in" after sanitization.

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose body is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Fragment,
    Element { tag: String, attrs: Vec<Attribute> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A markup fragment. Cloning produces a fully detached deep copy.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Fragment,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain_attrs(&mut self, id: NodeId, mut keep: impl FnMut(&Attribute) -> bool) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            attrs.retain(|a| keep(a));
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            let value = value.into();
            match attrs.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute::new(name, value)),
            }
        }
    }

    pub fn rename(&mut self, id: NodeId, new_tag: &str) {
        if let NodeData::Element { tag, .. } = &mut self.nodes[id.0].data {
            *tag = new_tag.to_string();
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Length of a text node in characters; zero for anything else.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    pub fn create_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        self.push_node(NodeData::Element {
            tag: tag.to_string(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Text(text.into()))
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Remove `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` into `parent` directly before `reference`, or at the end
    /// when `reference` is not one of `parent`'s children.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&c| c == reference) {
            Some(index) => siblings.insert(index, child),
            None => siblings.push(child),
        }
    }

    pub fn insert_after(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&c| c == reference) {
            Some(index) => siblings.insert(index + 1, child),
            None => siblings.push(child),
        }
    }

    /// Put `replacement` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) {
        let Some(parent) = self.nodes[old.0].parent else {
            return;
        };
        self.insert_before(parent, replacement, old);
        self.detach(old);
    }

    /// Move every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.nodes[from.0].children.clone() {
            self.append(to, child);
        }
    }

    /// Replace an element by its own children.
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        for child in self.nodes[id.0].children.clone() {
            self.insert_before(parent, child, id);
        }
        self.detach(id);
    }

    /// Split a text node at character offset `at`. The original node keeps
    /// the left part; the returned node holds the right part and follows it.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> NodeId {
        let (left, right) = match self.text(id) {
            Some(text) => {
                let byte = text
                    .char_indices()
                    .nth(at)
                    .map(|(index, _)| index)
                    .unwrap_or(text.len());
                (text[..byte].to_string(), text[byte..].to_string())
            }
            None => return id,
        };
        self.nodes[id.0].data = NodeData::Text(left);
        let tail = self.create_text(right);
        if let Some(parent) = self.nodes[id.0].parent {
            self.insert_after(parent, tail, id);
        }
        tail
    }

    /// Ancestors of `id` from its parent up to and excluding `stop`.
    pub fn ancestors_until(&self, id: NodeId, stop: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes[id.0].parent;
        while let Some(node) = current {
            if node == stop {
                break;
            }
            out.push(node);
            current = self.nodes[node.0].parent;
        }
        out
    }

    /// Text nodes under `id` in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(id, &mut |doc, node| {
            if matches!(doc.data(node), NodeData::Text(_)) {
                out.push(node);
            }
        });
        out
    }

    /// Elements under `id` (excluding `id`) in document order.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &child in self.children(id) {
            self.walk(child, &mut |doc, node| {
                if doc.tag(node).is_some() {
                    out.push(node);
                }
            });
        }
        out
    }

    fn walk(&self, id: NodeId, visit: &mut impl FnMut(&Self, NodeId)) {
        visit(self, id);
        for &child in self.children(id) {
            self.walk(child, visit);
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag(id).is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.data(id) {
            NodeData::Fragment => {
                for &child in self.children(id) {
                    self.write_node(child, false, out);
                }
            }
            NodeData::Text(text) if raw_text => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&attr.value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
                for &child in self.children(id) {
                    self.write_node(child, raw, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a markup fragment into a [`Document`].
///
/// The parser is tolerant: unknown close tags are ignored, unclosed elements
/// are closed at the end of input, and no implicit-close rules are applied.
pub fn parse_fragment(markup: &str) -> Document {
    let mut doc = Document::new();
    let mut parser = Parser::new(markup);
    let mut stack = vec![doc.root()];

    while !parser.eof() {
        let parent = stack[stack.len() - 1];

        if parser.starts_with("<!--") {
            parser.skip_comment();
            continue;
        }
        if parser.starts_with("</") {
            let name = parser.parse_close_tag();
            if let Some(depth) = stack
                .iter()
                .rposition(|&id| doc.tag(id) == Some(name.as_str()))
            {
                stack.truncate(depth);
            }
            continue;
        }
        if parser.starts_with("<!") || parser.starts_with("<?") {
            parser.skip_declaration();
            continue;
        }
        if parser.at_open_tag() {
            let (tag, attrs, self_closing) = parser.parse_open_tag();
            let element = doc.create_element(&tag, attrs);
            doc.append(parent, element);
            if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                let body = parser.take_raw_text(&tag);
                if !body.is_empty() {
                    let text = doc.create_text(body);
                    doc.append(element, text);
                }
            } else if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
                stack.push(element);
            }
            continue;
        }

        let text = decode_entities(parser.parse_text());
        match doc.children(parent).last().copied() {
            Some(last) if doc.text(last).is_some() => {
                if let NodeData::Text(existing) = &mut doc.nodes[last.0].data {
                    existing.push_str(&text);
                }
            }
            _ => {
                let node = doc.create_text(text);
                doc.append(parent, node);
            }
        }
    }

    doc
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
        }
    }

    fn at_open_tag(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// Consume text up to the next `<`. Always consumes at least one char so
    /// a lone `<` becomes literal text.
    fn parse_text(&mut self) -> &'a str {
        let start = self.pos;
        self.advance_char();
        match self.rest().find('<') {
            Some(offset) => self.pos += offset,
            None => self.pos = self.input.len(),
        }
        &self.input[start..self.pos]
    }

    fn skip_comment(&mut self) {
        match self.rest()[4..].find("-->") {
            Some(offset) => self.pos += 4 + offset + 3,
            None => self.pos = self.input.len(),
        }
    }

    fn skip_declaration(&mut self) {
        match self.rest().find('>') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.input.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance_char();
        }
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '>' || c == '/' || c == '=' {
                break;
            }
            self.advance_char();
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn parse_close_tag(&mut self) -> String {
        self.pos += 2;
        let name = self.parse_name();
        match self.rest().find('>') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.input.len(),
        }
        name
    }

    fn parse_open_tag(&mut self) -> (String, Vec<Attribute>, bool) {
        self.pos += 1;
        let tag = self.parse_name();
        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            if self.eof() {
                break;
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            if self.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if self.starts_with("/") || self.starts_with("=") {
                self.pos += 1;
                continue;
            }
            let name = self.parse_name();
            if name.is_empty() {
                self.advance_char();
                continue;
            }
            self.skip_whitespace();
            let value = if self.starts_with("=") {
                self.pos += 1;
                self.skip_whitespace();
                self.parse_attr_value()
            } else {
                String::new()
            };
            if !attrs.iter().any(|a| a.name == name) {
                attrs.push(Attribute::new(name, value));
            }
        }

        (tag, attrs, self_closing)
    }

    fn parse_attr_value(&mut self) -> String {
        let quote = match self.current_char() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                let start = self.pos;
                while let Some(c) = self.current_char() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    self.advance_char();
                }
                return decode_entities(&self.input[start..self.pos]);
            }
        };
        self.pos += 1;
        let start = self.pos;
        match self.rest().find(quote) {
            Some(offset) => {
                self.pos += offset + 1;
                decode_entities(&self.input[start..start + offset])
            }
            None => {
                self.pos = self.input.len();
                decode_entities(&self.input[start..])
            }
        }
    }

    fn take_raw_text(&mut self, tag: &str) -> String {
        let needle = format!("</{tag}");
        let haystack = self.rest().to_ascii_lowercase();
        match haystack.find(&needle) {
            Some(offset) => {
                let body = self.rest()[..offset].to_string();
                self.pos += offset;
                match self.rest().find('>') {
                    Some(close) => self.pos += close + 1,
                    None => self.pos = self.input.len(),
                }
                body
            }
            None => {
                let body = self.rest().to_string();
                self.pos = self.input.len();
                body
            }
        }
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
