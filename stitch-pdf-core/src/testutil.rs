//! Hand-assembled PDF fixtures shared across test modules.

/// Two pages, one bookmark pointing at the second page, and a catalog
/// `/Dests` dictionary with a single named destination.
pub fn sample_pdf() -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.3\n");
    obj(&mut out, 1, "<< /Type /Catalog /Pages 2 0 R /Outlines 7 0 R /Dests 10 0 R >>");
    obj(&mut out, 2, "<< /Type /Pages /Kids [ 3 0 R 4 0 R ] /Count 2 >>");
    obj(
        &mut out,
        3,
        "<< /Type /Page /Parent 2 0 R /MediaBox [ 0 0 612 792 ] /Contents 5 0 R >>",
    );
    obj(
        &mut out,
        4,
        "<< /Type /Page /Parent 2 0 R /MediaBox [ 0 0 612 792 ] /Contents 6 0 R >>",
    );
    obj(&mut out, 5, "<< /Length 8 >>\nstream\nq BT ET\nendstream");
    obj(&mut out, 6, "<< /Length 9 0 R >>\nstream\nq 1 0 0 1 0 0 cm Q\nendstream");
    obj(
        &mut out,
        7,
        "<< /Type /Outlines /First 8 0 R /Last 8 0 R /Count 1 >>",
    );
    obj(
        &mut out,
        8,
        "<< /Title (Second page) /Parent 7 0 R /Dest [ 4 0 R /FitH 792 ] >>",
    );
    obj(&mut out, 9, "18");
    obj(&mut out, 10, "<< /Intro [ 3 0 R /Fit ] >>");
    trailer(&mut out, 11, 1);
    out
}

/// Three pages with a two-level outline (a chapter heading followed by two
/// section bookmarks) and a named destination stored in a `/Names` tree.
pub fn chapters_pdf() -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.3\n");
    obj(&mut out, 1, "<< /Type /Catalog /Pages 2 0 R /Outlines 7 0 R /Names 12 0 R >>");
    obj(&mut out, 2, "<< /Type /Pages /Kids [ 3 0 R 4 0 R 5 0 R ] /Count 3 >>");
    for id in 3usize..=5 {
        obj(
            &mut out,
            id,
            "<< /Type /Page /Parent 2 0 R /MediaBox [ 0 0 612 792 ] /Contents 6 0 R >>",
        );
    }
    obj(&mut out, 6, "<< /Length 5 >>\nstream\nBT ET\nendstream");
    obj(
        &mut out,
        7,
        "<< /Type /Outlines /First 8 0 R /Last 8 0 R /Count 3 >>",
    );
    obj(
        &mut out,
        8,
        "<< /Title (Chapter 1) /Parent 7 0 R /First 9 0 R /Last 10 0 R /Count 2 \
         /Dest [ 3 0 R /Fit ] >>",
    );
    obj(
        &mut out,
        9,
        "<< /Title (Section 1.1) /Parent 8 0 R /Next 10 0 R /Dest [ 4 0 R /FitV 0 ] >>",
    );
    obj(
        &mut out,
        10,
        "<< /Title (Section 1.2) /Parent 8 0 R /Prev 9 0 R \
         /A << /S /GoTo /D [ 5 0 R /XYZ 0 792 1 ] >> >>",
    );
    obj(&mut out, 11, "<< /Names [ (epilogue) 13 0 R ] >>");
    obj(&mut out, 12, "<< /Dests 11 0 R >>");
    obj(&mut out, 13, "<< /D [ 5 0 R /FitB ] /S /GoTo >>");
    trailer(&mut out, 14, 1);
    out
}

fn obj(out: &mut Vec<u8>, id: usize, body: &str) {
    out.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
}

fn trailer(out: &mut Vec<u8>, size: usize, root: usize) {
    out.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n0\n%%EOF\n").as_bytes(),
    );
}
