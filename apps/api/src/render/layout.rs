//! Static font metrics and word wrapping for the exported document.
//!
//! Character widths are in em units (relative to font size), taken from the
//! standard Helvetica metrics the PDF built-in font uses. A static table is
//! an approximation — it catches the violations that matter (lines that
//! wrap, blocks that cross the page bottom) while tolerating ±1–2% of line
//! width. The table covers ASCII 0x20..=0x7E; anything else falls back to
//! `average_char_width`.

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Bold text measured with the regular table, widened by a flat factor.
const BOLD_FACTOR: f32 = 1.05;

/// Layout parameters for one exported page. A4 with fixed margins.
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub name_pt: f32,
    pub heading_pt: f32,
    pub sub_pt: f32,
    pub body_pt: f32,
    /// Side length of the square photo box anchored top-right on page one.
    pub photo_box_mm: f32,
    /// Vertical gap between blocks of the same section.
    pub block_gap_mm: f32,
    /// Vertical gap between sections.
    pub section_gap_mm: f32,
}

impl PageConfig {
    /// Usable text width between the margins.
    pub fn text_width_mm(&self) -> f32 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    /// Lowest allowed baseline before a page break.
    pub fn bottom_limit_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm
    }

    /// Baseline-to-baseline distance for a font size.
    pub fn line_height_mm(&self, size_pt: f32) -> f32 {
        size_pt * 1.35 * MM_PER_PT
    }
}

/// A4, 20mm margins, Helvetica sizes close to the on-screen preview.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width_mm: 210.0,
        page_height_mm: 297.0,
        margin_mm: 20.0,
        name_pt: 22.0,
        heading_pt: 13.0,
        sub_pt: 11.0,
        body_pt: 10.0,
        photo_box_mm: 32.0,
        block_gap_mm: 1.2,
        section_gap_mm: 4.0,
    }
}

/// Static character-width table. `widths[i]` is the width of ASCII
/// character `(i + 32)` in em units.
pub struct FontMetricTable {
    widths: [f32; 95],
    pub average_char_width: f32,
    pub space_width: f32,
}

/// Helvetica — the PDF built-in used for the whole document.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.513,
    space_width: 0.278,
};

pub fn helvetica() -> &'static FontMetricTable {
    &HELVETICA_TABLE
}

impl FontMetricTable {
    /// Measures a string in em units. Non-ASCII characters fall back to
    /// `average_char_width`.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Rendered width in millimetres at a font size.
    pub fn measure_mm(&self, s: &str, size_pt: f32, bold: bool) -> f32 {
        let factor = if bold { BOLD_FACTOR } else { 1.0 };
        self.measure_em(s) * size_pt * MM_PER_PT * factor
    }

    /// Greedy word wrap to `max_width_mm`. Explicit newlines start a new
    /// line; a single word wider than the line gets a line of its own.
    pub fn wrap(&self, text: &str, size_pt: f32, bold: bool, max_width_mm: f32) -> Vec<String> {
        let factor = if bold { BOLD_FACTOR } else { 1.0 };
        let scale = size_pt * MM_PER_PT * factor;
        let max_em = max_width_mm / scale;

        let mut lines = Vec::new();
        for raw_line in text.lines() {
            let words: Vec<&str> = raw_line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            let mut current = String::new();
            let mut current_em = 0.0_f32;
            for word in words {
                let word_em = self.measure_em(word);
                if current.is_empty() {
                    current.push_str(word);
                    current_em = word_em;
                } else if current_em + self.space_width + word_em > max_em {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_em = word_em;
                } else {
                    current.push(' ');
                    current.push_str(word);
                    current_em += self.space_width + word_em;
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }
        lines
    }
}
