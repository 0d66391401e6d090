use std::fmt::Write as FmtWrite;

/// Stroke settings for lines and polylines.
#[derive(Debug, Clone)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f64,
    pub dashed: bool,
}

impl LineStyle {
    pub fn solid(color: &'static str, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    pub fn dashed(color: &'static str, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: true,
        }
    }

    fn attrs(&self) -> String {
        let mut s = format!(
            r#"stroke="{}" stroke-width="{:.2}" fill="none""#,
            self.color, self.width
        );
        if self.dashed {
            s.push_str(r#" stroke-dasharray="6,4""#);
        }
        s
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub anchor: TextAnchor,
    pub bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 11.0,
            anchor: TextAnchor::Start,
            bold: false,
        }
    }
}

/// Immediate-mode SVG canvas. Coordinates in points, origin top-left.
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<String>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.elements.push(format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" {}/>"#,
            style.attrs()
        ));
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.is_empty() {
            return;
        }
        let mut pts = String::new();
        for (i, (x, y)) in points.iter().enumerate() {
            if i > 0 {
                pts.push(' ');
            }
            let _ = write!(pts, "{x:.2},{y:.2}");
        }
        self.elements
            .push(format!(r#"<polyline points="{pts}" {}/>"#, style.attrs()));
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.push_text(x, y, content, style, None);
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.push_text(x, y, content, style, Some(angle));
    }

    fn push_text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, rotate: Option<f64>) {
        let mut el = format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{:.1}" text-anchor="{}""#,
            style.size,
            style.anchor.as_str()
        );
        if style.bold {
            el.push_str(r#" font-weight="bold""#);
        }
        if let Some(angle) = rotate {
            let _ = write!(el, r#" transform="rotate({angle:.1} {x:.2} {y:.2})""#);
        }
        let _ = write!(el, ">{}</text>", escape_xml(content));
        self.elements.push(el);
    }

    pub fn finish_svg(self) -> String {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
            w = self.width,
            h = self.height
        );
        out.push('\n');
        let _ = writeln!(
            out,
            r#"<rect x="0" y="0" width="{:.0}" height="{:.0}" fill="white"/>"#,
            self.width, self.height
        );
        for el in &self.elements {
            out.push_str(el);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Linear mapping from a data range onto a pixel range.
#[derive(Debug, Clone, Copy)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
}

impl Axis {
    /// Builds an axis covering `values`, padded by 5% on both ends.
    /// A degenerate range is widened to keep the mapping finite.
    pub fn padded(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (lo, hi) = values
            .into_iter()
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        if hi - lo == 0.0 {
            let half = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            return Some(Self {
                min: lo - half,
                max: hi + half,
            });
        }

        let pad = (hi - lo) * 0.05;
        Some(Self {
            min: lo - pad,
            max: hi + pad,
        })
    }

    pub fn data_to_pixel(&self, v: f64, p0: f64, p1: f64) -> f64 {
        p0 + (v - self.min) / (self.max - self.min) * (p1 - p0)
    }

    /// `count + 1` evenly spaced values from `min` to `max`.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let count = count.max(1);
        (0..=count)
            .map(|i| self.min + (self.max - self.min) * i as f64 / count as f64)
            .collect()
    }
}
