use std::fmt::Write;

use expect_test::{expect, Expect};

use crate::file::SegmentKind;

use super::JpegParser;

fn dump(jpeg: &[u8]) -> String {
    fn dump_impl(jpeg: &[u8], out: &mut String) -> super::Result<()> {
        let mut parser = JpegParser::new(jpeg)?;

        while let Some(segment) = parser.next_segment()? {
            write!(
                out,
                "{:04X} [FF {:02X}] ",
                segment.offset(),
                segment.marker(),
            )
            .unwrap();

            match segment.as_segment_kind() {
                Some(kind) => {
                    write!(out, "{:?}", kind).unwrap();
                    match kind {
                        SegmentKind::App(app) if app.as_app_kind().is_none() => {
                            // Dump bytes of unknown APP segments too.
                            writeln!(out, " {:x?}", segment.parameters()).unwrap();
                        }
                        _ => writeln!(out).unwrap(),
                    }
                }
                None => writeln!(out, "{:x?}", segment.parameters()).unwrap(),
            }
        }

        if !parser.remaining().is_empty() {
            writeln!(
                out,
                "{} trailing bytes: {:x?}",
                parser.remaining().len(),
                parser.remaining()
            )
            .unwrap();
        }
        Ok(())
    }

    let mut out = String::new();
    if let Err(e) = dump_impl(jpeg, &mut out) {
        writeln!(out, "error: {e}").unwrap();
    }

    out
}

fn check(jpeg: &[u8], expect: Expect) {
    expect.assert_eq(&dump(jpeg));
}

#[test]
fn empty() {
    check(
        &[0xFF],
        expect![[r#"
            error: file is too short to be a JPEG
        "#]],
    );
    check(
        &[0xFF, 0xD8 /* SOI */],
        expect![[r#"
            error: reached end of data while decoding JPEG stream
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xD9, // EOI
        ],
        expect![[""]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xD9, // EOI
            0xFF, // trailing
        ],
        expect![[r#"
            1 trailing bytes: [ff]
        "#]],
    );
}

#[test]
fn not_a_jpeg() {
    check(
        &[0x89, 0x50, 0x4E, 0x47],
        expect![[r#"
            error: JPEG image does not start with SOI marker
        "#]],
    );
    let err = JpegParser::new(&[0x89, 0x50]).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::NotAJpeg);
}

#[test]
fn app() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, // APP0
            0x00, 0x02, // empty
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0002 [FF E0] App(App { n: 0, kind: None }) []
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, // APP0
            0x00, 0x04, // 2 more bytes after this
            0x00, 0x00, // APP0 contents (non-JFIF)
            0xFF, 0xDD, // DRI
            0x00, 0x04, // length
            0x00, 0x0F, // Ri
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0002 [FF E0] App(App { n: 0, kind: None }) [0, 0]
            0008 [FF DD] Dri(Dri { Ri: 15 })
        "#]],
    );
}

#[test]
fn jfif() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, // APP0
            0x00, 0x10, // length
            b'J', b'F', b'I', b'F', 0x00, // magic
            0x01, 0x01, // version 1.1
            0x00, // no density unit
            0x00, 0x01, // xdensity
            0x00, 0x01, // ydensity
            0x00, 0x00, // no thumbnail
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0002 [FF E0] App(App { n: 0, kind: Some(Jfif(Jfif { major_version: 1, minor_version: 1, unit: None, xdensity: 1, ydensity: 1, xthumbnail: 0, ythumbnail: 0, thumbnail: [] })) })
        "#]],
    );
}

#[test]
fn jfif_thumbnail() {
    let jpeg = [
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, // APP0
        0x00, 0x13, // length
        b'J', b'F', b'I', b'F', 0x00, // magic
        0x01, 0x02, // version 1.2
        0x01, // dots per inch
        0x00, 0x48, // xdensity
        0x00, 0x48, // ydensity
        0x01, 0x01, // 1×1 thumbnail
        0x0A, 0x14, 0x1E, // thumbnail RGB
        0xFF, 0xD9, // EOI
    ];
    let mut parser = JpegParser::new(&jpeg).unwrap();
    let segment = parser.next_segment().unwrap().unwrap();
    let Some(SegmentKind::App(app)) = segment.as_segment_kind() else {
        panic!("expected an APP segment");
    };
    let Some(crate::file::AppKind::Jfif(jfif)) = app.as_app_kind() else {
        panic!("expected a JFIF header");
    };
    assert_eq!(jfif.thumbnail_width(), 1);
    assert_eq!(jfif.thumbnail_height(), 1);
    assert_eq!(jfif.thumbnail_data(), &[0x0A, 0x14, 0x1E]);
}

#[test]
fn frame_and_scan() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, // SOF0
            0x00, 0x0B, // length
            0x08, // precision
            0x00, 0x08, // height
            0x00, 0x08, // width
            0x01, // 1 component
            0x01, 0x11, 0x00, // Ci=1, 1x1 sampling, qtable 0
            0xFF, 0xDA, // SOS
            0x00, 0x08, // length
            0x01, // 1 component
            0x01, 0x00, // Csj=1, tables 0/0
            0x00, 0x3F, 0x00, // Ss, Se, AhAl
            0x12, // scan data
            0xFF, 0xD0, // RST0 inside the scan
            0x34, // more scan data
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0002 [FF C0] Sof(Sof { sof: SOF0, P: 8, Y: 8, X: 8, components: [FrameComponent { Ci: 1, Hi: 1, Vi: 1, Tqi: 0 }] })
            000F [FF DA] Sos(Sos { components: [ScanComponent { Csj: 1, Tdj: 0, Taj: 0 }], Ss: 0, Se: 63, Ah: 0, Al: 0, data: [18, 255, 208, 52] })
        "#]],
    );
}

#[test]
fn unknown_marker_is_skipped_with_raw_bytes() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xC8, // JPG (reserved)
            0x00, 0x04, // length
            0xAA, 0xBB, // payload
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0002 [FF C8] [aa, bb]
        "#]],
    );
}

#[test]
fn raw_bytes_cover_length_and_parameters() {
    let jpeg = [
        0xFF, 0xD8, // SOI
        0xFF, 0xDD, // DRI
        0x00, 0x04, // length
        0x00, 0x0F, // Ri
        0xFF, 0xD9, // EOI
    ];
    let mut parser = JpegParser::new(&jpeg).unwrap();
    let segment = parser.next_segment().unwrap().unwrap();
    assert_eq!(segment.marker(), 0xDD);
    assert_eq!(segment.raw_bytes(), &[0x00, 0x04, 0x00, 0x0F]);
    assert_eq!(segment.parameters(), &[0x00, 0x0F]);
}

#[test]
fn truncated_segment_is_a_syntax_error() {
    let jpeg = [
        0xFF, 0xD8, // SOI
        0xFF, 0xDB, // DQT
        0x00, 0x43, // length (needs 65 parameter bytes)
        0x00, // only one present
    ];
    let err = JpegParser::new(&jpeg).unwrap().next_segment().unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::SyntaxError);
}
