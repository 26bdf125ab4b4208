//! Quality analysis over a job spec.
//!
//! Scans slide elements for layout and readability defects and emits
//! issue records, each bound to a concrete fix proposal. The review
//! adapter turns these into JSON-Patch payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::spec::{FontSpec, JobSpec, Slide};

/// Detection thresholds. Geometry is in inches, font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    #[serde(default = "d_min_font_size")]
    pub min_font_size: f64,
    #[serde(default = "d_default_font_size")]
    pub default_font_size: f64,
    #[serde(default = "d_max_bullet_level")]
    pub max_bullet_level: u8,
    #[serde(default = "d_default_font_color")]
    pub default_font_color: String,
    #[serde(default = "d_preferred_text_color")]
    pub preferred_text_color: String,
    #[serde(default = "d_background_color")]
    pub background_color: String,
    #[serde(default = "d_margin_in")]
    pub margin_in: f64,
    #[serde(default = "d_slide_width_in")]
    pub slide_width_in: f64,
    #[serde(default = "d_slide_height_in")]
    pub slide_height_in: f64,
    #[serde(default = "d_min_contrast")]
    pub min_contrast: f64,
    #[serde(default = "d_large_text_threshold_pt")]
    pub large_text_threshold_pt: f64,
    #[serde(default = "d_large_text_min_contrast")]
    pub large_text_min_contrast: f64,
}

fn d_min_font_size() -> f64 {
    14.0
}
fn d_default_font_size() -> f64 {
    16.0
}
fn d_max_bullet_level() -> u8 {
    3
}
fn d_default_font_color() -> String {
    "#333333".to_string()
}
fn d_preferred_text_color() -> String {
    "#005BAC".to_string()
}
fn d_background_color() -> String {
    "#FFFFFF".to_string()
}
fn d_margin_in() -> f64 {
    0.5
}
fn d_slide_width_in() -> f64 {
    10.0
}
fn d_slide_height_in() -> f64 {
    7.5
}
fn d_min_contrast() -> f64 {
    4.5
}
fn d_large_text_threshold_pt() -> f64 {
    18.0
}
fn d_large_text_min_contrast() -> f64 {
    3.0
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            min_font_size: d_min_font_size(),
            default_font_size: d_default_font_size(),
            max_bullet_level: d_max_bullet_level(),
            default_font_color: d_default_font_color(),
            preferred_text_color: d_preferred_text_color(),
            background_color: d_background_color(),
            margin_in: d_margin_in(),
            slide_width_in: d_slide_width_in(),
            slide_height_in: d_slide_height_in(),
            min_contrast: d_min_contrast(),
            large_text_threshold_pt: d_large_text_threshold_pt(),
            large_text_min_contrast: d_large_text_min_contrast(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTarget {
    pub slide_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
}

/// One fix proposal bound to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerFix {
    pub id: String,
    pub issue_id: String,
    #[serde(rename = "type")]
    pub fix_type: String,
    pub target: IssueTarget,
    pub payload: Value,
}

/// One detected defect with its bound fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerIssue {
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub message: String,
    pub target: IssueTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    pub fix: AnalyzerFix,
}

/// The `analysis.json` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub slides: usize,
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub issues: Vec<AnalyzerIssue>,
    #[serde(default)]
    pub fixes: Vec<AnalyzerFix>,
}

struct Detector<'a> {
    options: &'a AnalyzerOptions,
    issues: Vec<AnalyzerIssue>,
    fixes: Vec<AnalyzerFix>,
    next_id: usize,
}

impl<'a> Detector<'a> {
    fn new(options: &'a AnalyzerOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
            fixes: Vec::new(),
            next_id: 1,
        }
    }

    fn push(
        &mut self,
        issue_type: &str,
        severity: Severity,
        message: String,
        target: IssueTarget,
        metrics: Option<Value>,
        fix_type: &str,
        payload: Value,
    ) {
        let n = self.next_id;
        self.next_id += 1;
        let issue_id = format!("issue-{n}");
        let fix = AnalyzerFix {
            id: format!("fix-{n}"),
            issue_id: issue_id.clone(),
            fix_type: fix_type.to_string(),
            target: target.clone(),
            payload,
        };
        self.fixes.push(fix.clone());
        self.issues.push(AnalyzerIssue {
            id: issue_id,
            issue_type: issue_type.to_string(),
            severity,
            message,
            target,
            metrics,
            fix,
        });
    }

    fn check_geometry(
        &mut self,
        slide_id: &str,
        element_id: &str,
        element_type: &str,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) {
        let margin = self.options.margin_in;
        let max_right = self.options.slide_width_in - margin;
        let max_bottom = self.options.slide_height_in - margin;
        let right = left + width;
        let bottom = top + height;
        if left < margin || top < margin || right > max_right || bottom > max_bottom {
            let new_left = left.max(margin).min((max_right - width).max(margin));
            let new_top = top.max(margin).min((max_bottom - height).max(margin));
            self.push(
                "margin",
                Severity::Warning,
                format!("{element_type} '{element_id}' extends outside the safe margin"),
                IssueTarget {
                    slide_id: slide_id.to_string(),
                    element_id: Some(element_id.to_string()),
                    element_type: Some(element_type.to_string()),
                },
                Some(json!({
                    "left_in": left,
                    "top_in": top,
                    "right_in": right,
                    "bottom_in": bottom,
                    "margin_in": margin,
                })),
                "move",
                json!({ "left_in": new_left, "top_in": new_top }),
            );
        }
    }

    fn check_font(
        &mut self,
        slide_id: &str,
        element_id: &str,
        element_type: &str,
        font: Option<&FontSpec>,
    ) {
        let (size_pt, color_hex) = match font {
            Some(font) => (font.size_pt, font.color_hex.as_str()),
            None => (
                self.options.default_font_size,
                self.options.default_font_color.as_str(),
            ),
        };

        if size_pt < self.options.min_font_size {
            self.push(
                "font_min",
                Severity::Warning,
                format!(
                    "{element_type} '{element_id}' uses {size_pt:.1}pt, minimum is {:.1}pt",
                    self.options.min_font_size
                ),
                IssueTarget {
                    slide_id: slide_id.to_string(),
                    element_id: Some(element_id.to_string()),
                    element_type: Some(element_type.to_string()),
                },
                Some(json!({ "font_size_pt": size_pt })),
                "font_raise",
                json!({ "size_pt": self.options.min_font_size }),
            );
        }

        let ratio = contrast_ratio(color_hex, &self.options.background_color);
        let required = if size_pt >= self.options.large_text_threshold_pt {
            self.options.large_text_min_contrast
        } else {
            self.options.min_contrast
        };
        if ratio < required {
            self.push(
                "contrast_low",
                Severity::Warning,
                format!(
                    "{element_type} '{element_id}' contrast {ratio:.2} is below {required:.1}"
                ),
                IssueTarget {
                    slide_id: slide_id.to_string(),
                    element_id: Some(element_id.to_string()),
                    element_type: Some(element_type.to_string()),
                },
                Some(json!({
                    "ratio": ratio,
                    "required_ratio": required,
                    "font_size_pt": size_pt,
                })),
                "color_adjust",
                json!({ "color_hex": self.options.preferred_text_color }),
            );
        }
    }

    fn check_slide(&mut self, slide: &Slide) {
        for bullet in slide.iter_bullets() {
            self.check_font(&slide.id, &bullet.id, "bullet", bullet.font.as_ref());
            if bullet.level > self.options.max_bullet_level {
                self.push(
                    "bullet_depth",
                    Severity::Warning,
                    format!(
                        "bullet '{}' level {} exceeds maximum {}",
                        bullet.id, bullet.level, self.options.max_bullet_level
                    ),
                    IssueTarget {
                        slide_id: slide.id.clone(),
                        element_id: Some(bullet.id.clone()),
                        element_type: Some("bullet".to_string()),
                    },
                    Some(json!({ "level": bullet.level })),
                    "bullet_cap",
                    json!({ "level": self.options.max_bullet_level }),
                );
            }
        }

        // A slide whose shallowest bullet never reaches level 0 reads
        // as inconsistently indented relative to sibling slides.
        if let Some(min_level) = slide.iter_bullets().map(|b| b.level).min() {
            if min_level > 0 {
                let offender = slide
                    .iter_bullets()
                    .find(|b| b.level == min_level)
                    .map(|b| b.id.clone());
                self.push(
                    "layout_consistency",
                    Severity::Info,
                    format!(
                        "slide '{}' indents all bullets at level {min_level} or deeper",
                        slide.id
                    ),
                    IssueTarget {
                        slide_id: slide.id.clone(),
                        element_id: offender,
                        element_type: Some("bullet".to_string()),
                    },
                    None,
                    "bullet_reindent",
                    json!({ "level": 0 }),
                );
            }
        }

        for image in &slide.images {
            if let (Some(left), Some(top), Some(width), Some(height)) =
                (image.left_in, image.top_in, image.width_in, image.height_in)
            {
                self.check_geometry(&slide.id, &image.id, "image", left, top, width, height);
            }
        }
        for textbox in &slide.textboxes {
            self.check_font(&slide.id, &textbox.id, "textbox", textbox.font.as_ref());
            if let Some(position) = &textbox.position {
                self.check_geometry(
                    &slide.id,
                    &textbox.id,
                    "textbox",
                    position.left_in,
                    position.top_in,
                    position.width_in,
                    position.height_in,
                );
            }
        }
    }
}

/// Run every detection policy over a job spec.
pub fn analyze(spec: &JobSpec, options: &AnalyzerOptions) -> AnalysisDocument {
    let mut detector = Detector::new(options);
    for slide in &spec.slides {
        detector.check_slide(slide);
    }
    AnalysisDocument {
        slides: spec.slides.len(),
        meta: serde_json::to_value(&spec.meta).unwrap_or(Value::Null),
        issues: detector.issues,
        fixes: detector.fixes,
    }
}

fn channel(byte: u8) -> f64 {
    let c = byte as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn relative_luminance(hex: &str) -> f64 {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return 0.0;
    }
    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap_or(0);
    let (r, g, b) = (parse(0..2), parse(2..4), parse(4..6));
    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// WCAG contrast ratio between two hex colors, in [1, 21].
pub fn contrast_ratio(foreground: &str, background: &str) -> f64 {
    let lf = relative_luminance(foreground);
    let lb = relative_luminance(background);
    let (lighter, darker) = if lf >= lb { (lf, lb) } else { (lb, lf) };
    (lighter + 0.05) / (darker + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::JobSpec;

    fn options() -> AnalyzerOptions {
        AnalyzerOptions {
            min_font_size: 16.0,
            default_font_size: 16.0,
            max_bullet_level: 3,
            default_font_color: "#CCCCCC".to_string(),
            preferred_text_color: "#005BAC".to_string(),
            background_color: "#FFFFFF".to_string(),
            margin_in: 0.5,
            ..AnalyzerOptions::default()
        }
    }

    fn problem_spec() -> JobSpec {
        serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "Quality check"},
            "auth": {"created_by": "tester"},
            "slides": [{
                "id": "slide-1",
                "layout": "Title and Content",
                "title": "Problems",
                "bullets": [{"items": [{
                    "id": "bullet-1",
                    "text": "body",
                    "level": 4,
                    "font": {"name": "Yu Gothic", "size_pt": 12.0, "color_hex": "#FFFFFF"}
                }]}],
                "images": [{
                    "id": "img-1",
                    "source": "image.png",
                    "left_in": 0.1, "top_in": 0.2, "width_in": 9.5, "height_in": 7.0
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn detects_all_expected_issue_and_fix_types() {
        let analysis = analyze(&problem_spec(), &options());

        let issue_types: std::collections::HashSet<&str> =
            analysis.issues.iter().map(|i| i.issue_type.as_str()).collect();
        for expected in [
            "margin",
            "font_min",
            "contrast_low",
            "bullet_depth",
            "layout_consistency",
        ] {
            assert!(issue_types.contains(expected), "missing {expected}");
        }

        let fix_types: std::collections::HashSet<&str> =
            analysis.fixes.iter().map(|f| f.fix_type.as_str()).collect();
        for expected in ["move", "font_raise", "color_adjust", "bullet_cap", "bullet_reindent"] {
            assert!(fix_types.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn every_fix_references_an_existing_issue() {
        let analysis = analyze(&problem_spec(), &options());
        let issue_ids: std::collections::HashSet<&str> =
            analysis.issues.iter().map(|i| i.id.as_str()).collect();
        assert!(!analysis.fixes.is_empty());
        for fix in &analysis.fixes {
            assert!(issue_ids.contains(fix.issue_id.as_str()));
        }
    }

    #[test]
    fn layout_consistency_fix_reindents_to_zero() {
        let analysis = analyze(&problem_spec(), &options());
        let issue = analysis
            .issues
            .iter()
            .find(|i| i.issue_type == "layout_consistency")
            .unwrap();
        assert_eq!(issue.fix.payload["level"], 0);
    }

    #[test]
    fn contrast_issue_carries_required_ratio_and_font_size() {
        let analysis = analyze(&problem_spec(), &options());
        let issue = analysis
            .issues
            .iter()
            .find(|i| i.issue_type == "contrast_low")
            .unwrap();
        let metrics = issue.metrics.as_ref().unwrap();
        assert!((metrics["required_ratio"].as_f64().unwrap() - 4.5).abs() < 1e-9);
        assert!((metrics["font_size_pt"].as_f64().unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn large_text_tolerates_lower_contrast() {
        let spec: JobSpec = serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "Contrast"},
            "auth": {"created_by": "tester"},
            "slides": [{
                "id": "slide-large",
                "layout": "Title and Content",
                "bullets": [{"items": [{
                    "id": "bullet-large",
                    "text": "secondary color body",
                    "level": 0,
                    "font": {"name": "Yu Gothic", "size_pt": 24.0, "color_hex": "#0097A7"}
                }]}]
            }]
        }))
        .unwrap();
        let mut opts = options();
        opts.default_font_color = "#333333".to_string();
        let analysis = analyze(&spec, &opts);
        assert!(!analysis.issues.iter().any(|i| i.issue_type == "contrast_low"));
    }

    #[test]
    fn clean_spec_produces_no_issues() {
        let spec: JobSpec = serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "Clean"},
            "auth": {"created_by": "tester"},
            "slides": [{
                "id": "s1",
                "layout": "Title and Content",
                "bullets": [{"items": [{
                    "id": "b1",
                    "text": "fine",
                    "level": 0,
                    "font": {"name": "Yu Gothic", "size_pt": 18.0, "color_hex": "#333333"}
                }]}]
            }]
        }))
        .unwrap();
        let analysis = analyze(&spec, &options());
        assert!(analysis.issues.is_empty());
        assert!(analysis.fixes.is_empty());
    }

    #[test]
    fn contrast_ratio_is_symmetric_and_bounded() {
        let white_black = contrast_ratio("#FFFFFF", "#000000");
        assert!((white_black - 21.0).abs() < 0.01);
        assert!((contrast_ratio("#000000", "#FFFFFF") - white_black).abs() < 1e-9);
        assert!((contrast_ratio("#808080", "#808080") - 1.0).abs() < 1e-9);
    }
}
