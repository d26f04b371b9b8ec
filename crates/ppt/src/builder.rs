//! Mapping decoded shape records onto the output model.

use crate::context::DecodeContext;
use crate::shapes::ShapeRecord;
use crate::text::{font_style, CharacterRun, LinkRange, ParagraphRun, TextBlock};
use deckread_core::{
    Alignment, Bullet, BulletKind, Color, Error, Paragraph, Result, Rgb, Run, RunHyperlink, Shadow, Shape,
    ShapeKind, TextInsets,
};

const PARAGRAPH_BREAK: u16 = 0x000D;
const VERTICAL_TAB: u16 = 0x000B;

/// Defaults from the OfficeArt property tables.
const DEFAULT_LINE_WIDTH: u32 = 9525;
const DEFAULT_SHADOW_OFFSET: i32 = 25400;
const DEFAULT_BULLET: char = '\u{2022}';

/// Build the output shape for one decoded record, if it produces one.
///
/// Picture beats text, text beats line.
pub(crate) fn build_shape(record: &ShapeRecord, ctx: &DecodeContext<'_>) -> Result<Option<Shape>> {
    if !record.is_emitted() {
        return Ok(None);
    }
    let bounds = record.anchor.unwrap_or_default();
    let props = &record.properties;

    if let Some(blob_index) = props.blip_index {
        if ctx.pictures.resolve(blob_index).is_none() {
            return Err(shape_error(
                record,
                format!(
                    "picture index {} does not resolve ({} pictures)",
                    blob_index,
                    ctx.pictures.len()
                ),
            ));
        }
        let shadow = props.has_shadow().then(|| {
            shadow(
                props.shadow_offset_x.unwrap_or(DEFAULT_SHADOW_OFFSET),
                props.shadow_offset_y.unwrap_or(DEFAULT_SHADOW_OFFSET),
                props.shadow_color,
            )
        });
        return Ok(Some(Shape {
            bounds,
            kind: ShapeKind::Picture { blob_index, shadow },
        }));
    }

    if let Some(text) = &record.text {
        let defaults = TextInsets::default();
        let insets = TextInsets {
            left: props.text_left.unwrap_or(defaults.left),
            top: props.text_top.unwrap_or(defaults.top),
            right: props.text_right.unwrap_or(defaults.right),
            bottom: props.text_bottom.unwrap_or(defaults.bottom),
        };
        return Ok(Some(Shape {
            bounds,
            kind: ShapeKind::RichText {
                paragraphs: build_paragraphs(text, ctx).map_err(|e| annotate(record, e))?,
                insets,
                fill: props.fill_color,
            },
        }));
    }

    if props.is_line() {
        return Ok(Some(Shape {
            bounds,
            kind: ShapeKind::Line {
                color: props.line_color.unwrap_or(Color::Rgb(Rgb::BLACK)),
                width: props.line_width.unwrap_or(DEFAULT_LINE_WIDTH),
            },
        }));
    }

    Ok(None)
}

fn shape_error(record: &ShapeRecord, message: String) -> Error {
    Error::format(record.path.clone(), message)
}

/// Prefix model-building errors with the path of the shape they came from.
fn annotate(record: &ShapeRecord, err: Error) -> Error {
    match err {
        Error::Format { path, message } => Error::Format {
            path: format!("{} > {}", record.path, path),
            message,
        },
        other => other,
    }
}

fn shadow(dx: i32, dy: i32, color: Option<Color>) -> Shadow {
    let (dx, dy) = (f64::from(dx), f64::from(dy));
    let mut direction = dy.atan2(dx).to_degrees();
    if direction < 0.0 {
        direction += 360.0;
    }
    Shadow {
        distance: dx.hypot(dy),
        direction,
        color,
    }
}

/// Turn one text block into paragraphs.
pub(crate) fn build_paragraphs(block: &TextBlock, ctx: &DecodeContext<'_>) -> Result<Vec<Paragraph>> {
    match &block.style {
        Some((paragraph_runs, character_runs)) => {
            styled_paragraphs(block, paragraph_runs, character_runs, ctx)
        }
        None => plain_paragraphs(block, ctx),
    }
}

fn plain_paragraphs(block: &TextBlock, ctx: &DecodeContext<'_>) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Vec::new();
    let mut start = 0usize;
    for segment in block.units.split(|&u| u == PARAGRAPH_BREAK) {
        let mut run = Run::new(segment_text(segment, ctx));
        run.hyperlink = find_link(&block.links, start, segment.len(), ctx, &mut run.text)?;
        paragraphs.push(Paragraph {
            alignment: Alignment::default(),
            level: 0,
            bullet: no_bullet(),
            line_spacing: None,
            space_before: None,
            space_after: None,
            runs: vec![run],
        });
        start += segment.len() + 1;
    }
    Ok(paragraphs)
}

fn styled_paragraphs(
    block: &TextBlock,
    paragraph_runs: &[ParagraphRun],
    character_runs: &[CharacterRun],
    ctx: &DecodeContext<'_>,
) -> Result<Vec<Paragraph>> {
    if paragraph_runs.len() != character_runs.len() {
        return Err(Error::format(
            "text",
            format!(
                "{} paragraph runs but {} character runs",
                paragraph_runs.len(),
                character_runs.len()
            ),
        ));
    }

    let mut paragraphs = Vec::with_capacity(paragraph_runs.len());
    let mut levels = LevelTracker::new();
    let mut start = 0usize;

    for (para, chars) in paragraph_runs.iter().zip(character_runs) {
        let end = (start + para.char_count as usize).min(block.units.len());
        let mut segment = &block.units[start.min(end)..end];
        if let Some((&PARAGRAPH_BREAK, rest)) = segment.split_last() {
            segment = rest;
        }

        let mut run = character_run(segment_text(segment, ctx), chars, ctx)?;
        run.hyperlink = find_link(&block.links, start, segment.len(), ctx, &mut run.text)?;

        let props = &para.props;
        let alignment = match props.alignment {
            Some(value) => Alignment::from_u16(value).ok_or_else(|| {
                Error::format("text", format!("unknown paragraph alignment {}", value))
            })?,
            None => Alignment::default(),
        };

        paragraphs.push(Paragraph {
            alignment,
            level: levels.next(props.left_margin),
            bullet: bullet(para, ctx)?,
            line_spacing: props.line_spacing,
            space_before: props.space_before,
            space_after: props.space_after,
            runs: vec![run],
        });

        start += para.char_count as usize;
    }

    Ok(paragraphs)
}

/// Infers nesting depth from successive left margins.
///
/// The level starts at -1 and entering the first paragraph is a transition
/// of its own: it always steps to 0, with or without a margin. Each later
/// paragraph moves exactly one level in the direction its margin moved from
/// the last margin seen. A paragraph without a margin keeps the previous
/// level and margin. There is no lower bound, so a text box that opens
/// indented and then outdents reaches negative levels.
struct LevelTracker {
    level: i32,
    started: bool,
    margin: Option<i16>,
}

impl LevelTracker {
    fn new() -> Self {
        Self {
            level: -1,
            started: false,
            margin: None,
        }
    }

    fn next(&mut self, margin: Option<i16>) -> i32 {
        let step = if !self.started {
            self.started = true;
            1
        } else {
            match (self.margin, margin) {
                (Some(previous), Some(current)) => {
                    (current > previous) as i32 - (current < previous) as i32
                }
                _ => 0,
            }
        };
        if margin.is_some() {
            self.margin = margin;
        }
        self.level += step;
        self.level
    }
}

fn segment_text(units: &[u16], ctx: &DecodeContext<'_>) -> String {
    let units: Vec<u16> = units
        .iter()
        .map(|&u| if u == VERTICAL_TAB { u16::from(b'\n') } else { u })
        .collect();
    ctx.decode_units(&units)
}

fn font_name(index: u16, ctx: &DecodeContext<'_>) -> Result<String> {
    ctx.fonts
        .get(usize::from(index))
        .map(str::to_string)
        .ok_or_else(|| {
            Error::format(
                "text",
                format!(
                    "typeface index {} out of range ({} fonts)",
                    index,
                    ctx.fonts.len()
                ),
            )
        })
}

fn character_run(text: String, chars: &CharacterRun, ctx: &DecodeContext<'_>) -> Result<Run> {
    let props = &chars.props;
    Ok(Run {
        text,
        font_name: props.typeface.map(|i| font_name(i, ctx)).transpose()?,
        font_size: props.size,
        bold: props.has_style(font_style::BOLD),
        italic: props.has_style(font_style::ITALIC),
        underline: props.has_style(font_style::UNDERLINE),
        color: props.color,
        hyperlink: None,
    })
}

fn no_bullet() -> Bullet {
    Bullet {
        kind: BulletKind::None,
        character: DEFAULT_BULLET,
        font: None,
        size: None,
        color: None,
    }
}

fn bullet(para: &ParagraphRun, ctx: &DecodeContext<'_>) -> Result<Bullet> {
    let props = &para.props;
    Ok(Bullet {
        kind: if props.has_bullet() {
            BulletKind::Character
        } else {
            BulletKind::None
        },
        character: props
            .bullet_char
            .and_then(|c| char::from_u32(u32::from(c)))
            .unwrap_or(DEFAULT_BULLET),
        font: props.bullet_font.map(|i| font_name(i, ctx)).transpose()?,
        size: props.bullet_size,
        color: props.bullet_color,
    })
}

/// Bind the hyperlink whose range is exactly this run, if any. An empty run
/// takes the hyperlink's friendly name as its text.
fn find_link(
    links: &[LinkRange],
    start: usize,
    len: usize,
    ctx: &DecodeContext<'_>,
    text: &mut String,
) -> Result<Option<RunHyperlink>> {
    let Some(range) = links
        .iter()
        .find(|r| r.start as usize == start && r.end as usize == start + len)
    else {
        return Ok(None);
    };

    let hyperlink = ctx.hyperlinks.get(range.hyperlink_id).ok_or_else(|| {
        Error::format(
            "text",
            format!("hyperlink {} is not in the external object list", range.hyperlink_id),
        )
    })?;
    if text.is_empty() {
        text.clone_from(&hyperlink.friendly_name);
    }
    Ok(Some(RunHyperlink {
        id: range.hyperlink_id,
        url: hyperlink.target.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodeOptions;
    use crate::properties::ShapeProperties;
    use crate::shapes::ShapeFlags;
    use crate::text::{CharacterProps, ParagraphProps, TextType};
    use deckread_core::{Bounds, Color, Hyperlink, PictureData, PictureFormat};

    fn para_run(char_count: u32, left_margin: Option<i16>) -> ParagraphRun {
        ParagraphRun {
            char_count,
            indent_level: 0,
            props: ParagraphProps {
                left_margin,
                ..Default::default()
            },
        }
    }

    fn char_run(char_count: u32, props: CharacterProps) -> CharacterRun {
        CharacterRun { char_count, props }
    }

    fn block(text: &str, style: Option<(Vec<ParagraphRun>, Vec<CharacterRun>)>) -> TextBlock {
        TextBlock {
            text_type: TextType::Body,
            units: text.encode_utf16().collect(),
            style,
            links: Vec::new(),
        }
    }

    #[test]
    fn test_levels_follow_margin_transitions() {
        let margins = [0, 50, 50, 20, 20];
        let pf: Vec<_> = margins.iter().map(|&m| para_run(2, Some(m))).collect();
        let cf: Vec<_> = (0..5).map(|_| char_run(2, CharacterProps::default())).collect();
        let text = block("a\rb\rc\rd\re", Some((pf, cf)));

        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let paragraphs = build_paragraphs(&text, &ctx).unwrap();
        let levels: Vec<i32> = paragraphs.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![0, 1, 1, 0, 0]);
        let texts: Vec<String> = paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_level_moves_one_step_and_ignores_missing_margin() {
        let pf = vec![
            para_run(2, Some(100)),
            para_run(2, Some(900)),
            para_run(2, None),
            para_run(2, Some(0)),
        ];
        let cf = (0..4).map(|_| char_run(2, CharacterProps::default())).collect();
        let text = block("a\rb\rc\rd", Some((pf, cf)));

        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let levels: Vec<i32> = build_paragraphs(&text, &ctx)
            .unwrap()
            .iter()
            .map(|p| p.level)
            .collect();
        assert_eq!(levels, vec![0, 1, 1, 0]);

        let pf = vec![para_run(2, Some(100)), para_run(2, Some(50)), para_run(1, Some(10))];
        let cf = (0..3).map(|_| char_run(2, CharacterProps::default())).collect();
        let text = block("a\rb\r", Some((pf, cf)));
        let levels: Vec<i32> = build_paragraphs(&text, &ctx)
            .unwrap()
            .iter()
            .map(|p| p.level)
            .collect();
        assert_eq!(levels, vec![0, -1, -2]);
    }

    #[test]
    fn test_first_paragraph_steps_to_level_zero_without_margin() {
        let pf = vec![para_run(2, None), para_run(2, Some(100)), para_run(2, Some(200))];
        let cf = (0..3).map(|_| char_run(2, CharacterProps::default())).collect();
        let text = block("a\rb\rc", Some((pf, cf)));

        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let levels: Vec<i32> = build_paragraphs(&text, &ctx)
            .unwrap()
            .iter()
            .map(|p| p.level)
            .collect();
        // The second paragraph has no earlier margin to compare against.
        assert_eq!(levels, vec![0, 0, 1]);
    }

    #[test]
    fn test_run_count_mismatch() {
        let pf = vec![para_run(3, None), para_run(3, None)];
        let cf = vec![char_run(6, CharacterProps::default())];
        let text = block("ab\rcd", Some((pf, cf)));

        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let err = build_paragraphs(&text, &ctx).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("2 paragraph runs but 1 character runs"));
    }

    #[test]
    fn test_character_formatting_and_fonts() {
        let props = CharacterProps {
            style: Some(font_style::BOLD | font_style::UNDERLINE),
            typeface: Some(1),
            size: Some(28),
            color: Some(Color::Scheme(2)),
            position: None,
        };
        let text = block("Hi", Some((vec![para_run(3, None)], vec![char_run(3, props)])));

        let options = DecodeOptions::new();
        let mut ctx = DecodeContext::new(&options);
        ctx.fonts.push("Arial");
        ctx.fonts.push("Calibri");

        let paragraphs = build_paragraphs(&text, &ctx).unwrap();
        let run = &paragraphs[0].runs[0];
        assert_eq!(run.text, "Hi");
        assert_eq!(run.font_name.as_deref(), Some("Calibri"));
        assert_eq!(run.font_size, Some(28));
        assert!(run.bold && run.underline && !run.italic);
        assert_eq!(run.color, Some(Color::Scheme(2)));

        let bad = CharacterProps {
            typeface: Some(7),
            ..Default::default()
        };
        let text = block("Hi", Some((vec![para_run(3, None)], vec![char_run(3, bad)])));
        assert!(build_paragraphs(&text, &ctx).unwrap_err().is_format());
    }

    #[test]
    fn test_plain_text_splits_on_paragraph_marks() {
        let text = block("one\rtwo\u{b}lines\r", None);
        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let texts: Vec<String> = build_paragraphs(&text, &ctx)
            .unwrap()
            .iter()
            .map(Paragraph::text)
            .collect();
        assert_eq!(texts, vec!["one", "two\nlines", ""]);
    }

    #[test]
    fn test_hyperlink_splicing() {
        let pf = vec![para_run(5, None), para_run(1, None)];
        let cf = vec![
            char_run(5, CharacterProps::default()),
            char_run(1, CharacterProps::default()),
        ];
        let mut text = block("link\r", Some((pf, cf)));
        text.links = vec![
            LinkRange {
                start: 0,
                end: 4,
                hyperlink_id: 9,
            },
            LinkRange {
                start: 5,
                end: 5,
                hyperlink_id: 9,
            },
        ];

        let options = DecodeOptions::new();
        let mut ctx = DecodeContext::new(&options);
        ctx.hyperlinks.insert(
            9,
            Hyperlink {
                friendly_name: "Example".into(),
                target: "https://example.com".into(),
                location: None,
            },
        );

        let paragraphs = build_paragraphs(&text, &ctx).unwrap();
        let first = &paragraphs[0].runs[0];
        assert_eq!(first.text, "link");
        assert_eq!(first.hyperlink.as_ref().unwrap().url, "https://example.com");

        let second = &paragraphs[1].runs[0];
        assert_eq!(second.text, "Example");
        assert_eq!(second.hyperlink.as_ref().unwrap().id, 9);
    }

    fn shape_with(properties: ShapeProperties, text: Option<TextBlock>) -> ShapeRecord {
        ShapeRecord {
            path: "Slide > drawing > OfficeArtDg > groupShape > shape".to_string(),
            shape_type: 75,
            spid: 1025,
            flags: ShapeFlags::new(0x0A00),
            properties,
            anchor: Some(Bounds {
                offset_x: 1,
                offset_y: 2,
                width: 3,
                height: 4,
            }),
            text,
        }
    }

    #[test]
    fn test_picture_index_resolution() {
        let options = DecodeOptions::new();
        let mut ctx = DecodeContext::new(&options);
        ctx.pictures.push(PictureData {
            format: PictureFormat::Png,
            data: vec![1],
        });
        ctx.pictures.push(PictureData {
            format: PictureFormat::Jpeg,
            data: vec![2],
        });

        let record = shape_with(
            ShapeProperties {
                blip_index: Some(2),
                ..Default::default()
            },
            Some(block("ignored", None)),
        );
        let shape = build_shape(&record, &ctx).unwrap().unwrap();
        assert_eq!(
            shape.kind,
            ShapeKind::Picture {
                blob_index: 2,
                shadow: None
            }
        );
        assert_eq!(ctx.pictures.resolve(2).unwrap().data, vec![2]);

        for index in [0, 3] {
            let record = shape_with(
                ShapeProperties {
                    blip_index: Some(index),
                    ..Default::default()
                },
                None,
            );
            let err = build_shape(&record, &ctx).unwrap_err();
            assert!(err.is_format());
            assert_eq!(err.path(), Some("Slide > drawing > OfficeArtDg > groupShape > shape"));
        }
    }

    #[test]
    fn test_text_errors_carry_the_shape_path() {
        let pf = vec![para_run(3, None), para_run(3, None)];
        let cf = vec![char_run(6, CharacterProps::default())];
        let record = shape_with(
            ShapeProperties::default(),
            Some(block("ab\rcd", Some((pf, cf)))),
        );

        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let err = build_shape(&record, &ctx).unwrap_err();
        assert_eq!(
            err.path(),
            Some("Slide > drawing > OfficeArtDg > groupShape > shape > text")
        );
    }

    #[test]
    fn test_picture_shadow() {
        let options = DecodeOptions::new();
        let mut ctx = DecodeContext::new(&options);
        ctx.pictures.push(PictureData {
            format: PictureFormat::Png,
            data: Vec::new(),
        });
        let record = shape_with(
            ShapeProperties {
                blip_index: Some(1),
                shadow_offset_x: Some(0),
                shadow_offset_y: Some(12700),
                ..Default::default()
            },
            None,
        );
        let Some(Shape {
            kind: ShapeKind::Picture {
                shadow: Some(shadow),
                ..
            },
            ..
        }) = build_shape(&record, &ctx).unwrap()
        else {
            panic!("expected a picture with a shadow");
        };
        assert!((shadow.distance - 12700.0).abs() < 1e-9);
        assert!((shadow.direction - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_then_line_priority() {
        let options = DecodeOptions::new();
        let ctx = DecodeContext::new(&options);
        let line_props = ShapeProperties {
            line_booleans: Some(0x0008_0008),
            line_width: Some(12700),
            ..Default::default()
        };

        let text_shape = build_shape(&shape_with(line_props.clone(), Some(block("t", None))), &ctx)
            .unwrap()
            .unwrap();
        assert!(matches!(text_shape.kind, ShapeKind::RichText { .. }));

        let line = build_shape(&shape_with(line_props, None), &ctx).unwrap().unwrap();
        assert_eq!(
            line.kind,
            ShapeKind::Line {
                color: Color::Rgb(Rgb::BLACK),
                width: 12700
            }
        );
        assert_eq!(line.bounds.height, 4);

        let nothing = build_shape(&shape_with(ShapeProperties::default(), None), &ctx).unwrap();
        assert!(nothing.is_none());
    }
}
