use crate::library::rank_order;

use super::{CanvasConfig, LayoutNode, SizedItem};

/// Gap kept between neighbouring circles.
pub const PACK_PADDING: f64 = 3.0;

const INTERSECT_EPSILON: f64 = 1e-6;
const FIT_PASSES: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

pub fn compute_packed_layout(items: &[SizedItem], canvas: &CanvasConfig) -> Vec<LayoutNode> {
    if items.is_empty() {
        return Vec::new();
    }

    let mut ordered = items.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| rank_order(&a.item, &b.item));

    let radii = ordered
        .iter()
        .map(|sized| f64::from(sized.radius))
        .collect::<Vec<_>>();

    let available = f64::from(canvas.available_radius()).max(1.0);
    let (circles, scale) = fit_pack(&radii, available);

    let center = canvas.center();
    ordered
        .iter()
        .zip(circles.iter())
        .map(|(sized, circle)| LayoutNode {
            id: sized.item.id,
            x: center.x + (circle.x * scale) as f32,
            y: center.y + (circle.y * scale) as f32,
            r: (circle.r * scale) as f32,
        })
        .collect()
}

fn pack_with_padding(radii: &[f64], padding: f64) -> Vec<Circle> {
    let mut circles = radii
        .iter()
        .map(|&r| Circle {
            x: 0.0,
            y: 0.0,
            r: r + padding,
        })
        .collect::<Vec<_>>();

    pack_siblings(&mut circles);

    for circle in &mut circles {
        circle.r -= padding;
    }
    circles
}

/// Packs and picks a uniform scale that fits `available`, re-packing with a
/// larger padding when shrinking so the final gap stays near `PACK_PADDING`.
fn fit_pack(radii: &[f64], available: f64) -> (Vec<Circle>, f64) {
    let mut padding = PACK_PADDING;
    let mut circles = pack_with_padding(radii, padding);
    let mut reach = reach_radius(&circles);

    for _ in 0..FIT_PASSES {
        if reach <= available {
            break;
        }
        let needed = PACK_PADDING * reach / available;
        if needed <= padding + 1e-9 {
            break;
        }
        padding = needed;
        circles = pack_with_padding(radii, padding);
        reach = reach_radius(&circles);
    }

    let scale = if reach > available {
        available / reach
    } else {
        1.0
    };
    (circles, scale)
}

fn reach_radius(circles: &[Circle]) -> f64 {
    circles
        .iter()
        .map(|circle| circle.x.hypot(circle.y) + circle.r)
        .fold(0.0, f64::max)
}

fn pack_siblings(circles: &mut [Circle]) {
    let n = circles.len();
    if n == 0 {
        return;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        recenter(circles);
        return;
    }

    circles[2] = place(circles[1], circles[0], circles[2]);

    // Doubly linked front chain over circle indices.
    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    let (mut a, mut b) = (0usize, 1usize);
    next[0] = 1;
    prev[1] = 0;
    next[1] = 2;
    prev[2] = 1;
    next[2] = 0;
    prev[0] = 2;

    let mut i = 3;
    'pack: while i < n {
        circles[i] = place(circles[a], circles[b], circles[i]);
        let c = i;

        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        let mut best = a;
        let mut best_score = chain_score(circles, a, next[a]);
        let mut cursor = next[c];
        while cursor != b {
            let score = chain_score(circles, cursor, next[cursor]);
            if score < best_score {
                best = cursor;
                best_score = score;
            }
            cursor = next[cursor];
        }
        a = best;
        b = next[a];
        i += 1;
    }

    let mut chain = vec![circles[b]];
    let mut cursor = next[b];
    while cursor != b {
        chain.push(circles[cursor]);
        cursor = next[cursor];
    }

    if let Some(enclosing) = enclose(&chain) {
        for circle in circles.iter_mut() {
            circle.x -= enclosing.x;
            circle.y -= enclosing.y;
        }
    }
}

fn recenter(circles: &mut [Circle]) {
    if let Some(enclosing) = enclose(circles) {
        for circle in circles.iter_mut() {
            circle.x -= enclosing.x;
            circle.y -= enclosing.y;
        }
    }
}

fn place(b: Circle, a: Circle, mut c: Circle) -> Circle {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
    c
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - INTERSECT_EPSILON;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn chain_score(circles: &[Circle], a: usize, b: usize) -> f64 {
    let (a, b) = (circles[a], circles[b]);
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Smallest circle enclosing every circle in `circles`, built incrementally
/// from a support basis of at most three circles.
fn enclose(circles: &[Circle]) -> Option<Circle> {
    let mut basis: Vec<Circle> = Vec::new();
    let mut enclosing: Option<Circle> = None;
    let mut i = 0;
    let mut restarts = 0usize;
    let restart_limit = circles.len().saturating_mul(circles.len()).max(16) * 4;

    while i < circles.len() {
        let p = circles[i];
        if enclosing.is_some_and(|e| encloses_weak(e, p)) {
            i += 1;
            continue;
        }

        restarts += 1;
        if restarts > restart_limit {
            return Some(bounding_fallback(circles));
        }

        basis = match extend_basis(&basis, p) {
            Some(basis) => basis,
            None => return Some(bounding_fallback(circles)),
        };
        enclosing = enclose_basis(&basis);
        i = 0;
    }

    enclosing
}

fn bounding_fallback(circles: &[Circle]) -> Circle {
    let count = circles.len().max(1) as f64;
    let cx = circles.iter().map(|c| c.x).sum::<f64>() / count;
    let cy = circles.iter().map(|c| c.y).sum::<f64>() / count;
    let r = circles
        .iter()
        .map(|c| (c.x - cx).hypot(c.y - cy) + c.r)
        .fold(0.0, f64::max);
    Circle { x: cx, y: cy, r }
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }

    for &candidate in basis {
        if encloses_not(p, candidate) && encloses_weak_all(enclose_two(candidate, p), basis) {
            return Some(vec![candidate, p]);
        }
    }

    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (basis[i], basis[j]);
            if encloses_not(enclose_two(bi, bj), p)
                && encloses_not(enclose_two(bi, p), bj)
                && encloses_not(enclose_two(bj, p), bi)
                && encloses_weak_all(enclose_three(bi, bj, p), basis)
            {
                return Some(vec![bi, bj, p]);
            }
        }
    }

    None
}

fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Option<Circle> {
    match basis {
        [a] => Some(*a),
        [a, b] => Some(enclose_two(*a, *b)),
        [a, b, c] => Some(enclose_three(*a, *b, *c)),
        _ => None,
    }
}

fn enclose_two(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = x21.hypot(y21);
    if l <= f64::EPSILON {
        return if a.r >= b.r { a } else { b };
    }
    Circle {
        x: (a.x + b.x + x21 / l * r21) / 2.0,
        y: (a.y + b.y + y21 / l * r21) / 2.0,
        r: (l + a.r + b.r) / 2.0,
    }
}

fn enclose_three(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    if ab.abs() <= f64::EPSILON {
        // Collinear centers: the outer pair already bounds the middle one.
        return [enclose_two(a, b), enclose_two(a, c), enclose_two(b, c)]
            .into_iter()
            .max_by(|x, y| x.r.total_cmp(&y.r))
            .unwrap_or(a);
    }
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).max(0.0).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });
    Circle {
        x: x1 + xa + xb * r,
        y: y1 + ya + yb * r,
        r,
    }
}
