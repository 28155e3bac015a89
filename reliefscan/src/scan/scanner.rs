//! Incremental directional scanner.

use std::sync::Arc;

use crate::geom::Pt2i;

/// Octant of the scan direction, after stroke normalization.
///
/// With the strip direction `(a, b)` brought to `a >= 0` (and `b > 0` when
/// `a = 0`): O1 is steep up-left, O2 shallow up-left, O7 shallow up-right,
/// O8 steep up-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOctant {
    O1,
    O2,
    O7,
    O8,
}

impl ScanOctant {
    /// Selects the octant for a canonical strip direction.
    pub fn of(a: i32, b: i32) -> ScanOctant {
        if b < 0 {
            if -b > a {
                ScanOctant::O1
            } else {
                ScanOctant::O2
            }
        } else if b > a {
            ScanOctant::O8
        } else {
            ScanOctant::O7
        }
    }

    /// Whether the support value `ax + by` decreases along the scan walk.
    #[inline]
    fn decreasing(self) -> bool {
        matches!(self, ScanOctant::O1 | ScanOctant::O2)
    }
}

/// Behavioural mode of a scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanMode {
    /// Classic incremental scanner.
    Incremental,
    /// Re-bindable scanner: the strip can be recentered on a new digital
    /// line while preserving its width.
    Adaptive,
    /// Orthographic scanner: every scan is a pure row or column.
    Orthographic,
}

/// Incremental generator of parallel scans across a lattice area.
#[derive(Clone, Debug)]
pub struct DirectionalScanner {
    octant: ScanOctant,
    mode: ScanMode,
    // scan area (left, bottom, right, top; right/top exclusive)
    xmin: i32,
    ymin: i32,
    xmax: i32,
    ymax: i32,
    // support lines a*x + b*y = c1 (scan start side) and c2 (scan end side)
    dla: i32,
    dlb: i32,
    dlc1: i32,
    dlc2: i32,
    // template strip parameters, used by bind_to to preserve the width
    templ_a: i32,
    templ_b: i32,
    templ_nu: i32,
    // support line pattern, shared by scanner copies
    steps: Arc<[bool]>,
    // pattern cursors and start positions of the last scans on each side
    lst2: usize,
    rst2: usize,
    lcx: i32,
    lcy: i32,
    rcx: i32,
    rcy: i32,
    // central scan start, kept for locate
    ccx: i32,
    ccy: i32,
    cst2: usize,
    clearance: bool,
}

impl DirectionalScanner {
    /// Creates a scanner whose central scan joins a start point to the upper
    /// support line `a*x + b*y = c2`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_start(
        octant: ScanOctant,
        mode: ScanMode,
        area: (i32, i32, i32, i32),
        a: i32,
        b: i32,
        c2: i32,
        steps: Arc<[bool]>,
        sx: i32,
        sy: i32,
    ) -> Self {
        let dlc1 = a * sx + b * sy;
        let templ_nu = (c2 - dlc1).abs();
        DirectionalScanner {
            octant,
            mode,
            xmin: area.0,
            ymin: area.1,
            xmax: area.2,
            ymax: area.3,
            dla: a,
            dlb: b,
            dlc1,
            dlc2: c2,
            templ_a: a,
            templ_b: b,
            templ_nu,
            steps,
            lst2: 0,
            rst2: 0,
            lcx: sx,
            lcy: sy,
            rcx: sx,
            rcy: sy,
            ccx: sx,
            ccy: sy,
            cst2: 0,
            clearance: true,
        }
    }

    /// Creates a scanner from a central scan center and a scan length.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_center_length(
        octant: ScanOctant,
        mode: ScanMode,
        area: (i32, i32, i32, i32),
        a: i32,
        b: i32,
        steps: Arc<[bool]>,
        cx: i32,
        cy: i32,
        length: i32,
    ) -> Self {
        let mut sc = DirectionalScanner {
            octant,
            mode,
            xmin: area.0,
            ymin: area.1,
            xmax: area.2,
            ymax: area.3,
            dla: a,
            dlb: b,
            dlc1: 0,
            dlc2: 0,
            templ_a: a,
            templ_b: b,
            templ_nu: 0,
            steps,
            lst2: 0,
            rst2: 0,
            lcx: cx,
            lcy: cy,
            rcx: cx,
            rcy: cy,
            ccx: cx,
            ccy: cy,
            cst2: 0,
            clearance: true,
        };
        let w_2 = (length + 1) / 2;
        for _ in 0..w_2 {
            sc.step_backward_left();
        }
        sc.dlc1 = sc.dla * sc.lcx + sc.dlb * sc.lcy;
        // walk the same distance forward from the center for the other bound
        let (mut fx, mut fy) = (cx, cy);
        let mut cursor = 0usize;
        for _ in 0..w_2 {
            let (nx, ny, nc) = sc.forward_step(fx, fy, cursor);
            fx = nx;
            fy = ny;
            cursor = nc;
        }
        sc.dlc2 = sc.dla * fx + sc.dlb * fy;
        sc.templ_nu = (sc.dlc2 - sc.dlc1).abs();
        sc.rst2 = sc.lst2;
        sc.rcx = sc.lcx;
        sc.rcy = sc.lcy;
        sc.ccx = sc.lcx;
        sc.ccy = sc.lcy;
        sc.cst2 = sc.lst2;
        sc
    }

    /// Disables the clearing of the output vector before each scan.
    pub fn release_clearance(&mut self) {
        self.clearance = false;
    }

    /// Returns the scan octant.
    #[inline]
    pub fn octant(&self) -> ScanOctant {
        self.octant
    }

    /// Returns the scanner mode.
    #[inline]
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    #[inline]
    fn value(&self, x: i32, y: i32) -> i32 {
        self.dla * x + self.dlb * y
    }

    #[inline]
    fn in_strip(&self, v: i32) -> bool {
        if self.octant.decreasing() {
            v >= self.dlc2
        } else {
            v <= self.dlc2
        }
    }

    /// One step backward along the scan direction on the left start cursor.
    fn step_backward_left(&mut self) {
        if self.mode == ScanMode::Orthographic {
            match self.octant {
                ScanOctant::O1 | ScanOctant::O8 => self.lcy -= 1,
                ScanOctant::O2 => self.lcx += 1,
                ScanOctant::O7 => self.lcx -= 1,
            }
            return;
        }
        self.lst2 = if self.lst2 == 0 { self.steps.len() - 1 } else { self.lst2 - 1 };
        let st = self.steps[self.lst2];
        match self.octant {
            ScanOctant::O1 => {
                if st {
                    self.lcx += 1;
                }
                self.lcy -= 1;
            }
            ScanOctant::O2 => {
                if st {
                    self.lcy -= 1;
                }
                self.lcx += 1;
            }
            ScanOctant::O7 => {
                if st {
                    self.lcy -= 1;
                }
                self.lcx -= 1;
            }
            ScanOctant::O8 => {
                if st {
                    self.lcx -= 1;
                }
                self.lcy -= 1;
            }
        }
    }

    /// Emits one scan from the given start into `scan`, returning its size.
    fn emit(&self, sx: i32, sy: i32, cursor: usize, scan: &mut Vec<Pt2i>) -> usize {
        let before = scan.len();
        let (mut x, mut y, mut c) = (sx, sy, cursor);
        // skip the part of the scan before the area
        loop {
            let pre = match self.octant {
                ScanOctant::O7 | ScanOctant::O8 => x < self.xmin || y < self.ymin,
                ScanOctant::O1 | ScanOctant::O2 => x >= self.xmax || y < self.ymin,
            };
            if !pre || !self.in_strip(self.value(x, y)) {
                break;
            }
            let (nx, ny, nc) = self.forward_step(x, y, c);
            x = nx;
            y = ny;
            c = nc;
        }
        // emit the clipped scan
        while self.in_strip(self.value(x, y)) {
            let inside = match self.octant {
                ScanOctant::O7 | ScanOctant::O8 => x < self.xmax && y < self.ymax,
                ScanOctant::O1 | ScanOctant::O2 => x >= self.xmin && y < self.ymax,
            };
            if !inside {
                break;
            }
            scan.push(Pt2i::new(x, y));
            let (nx, ny, nc) = self.forward_step(x, y, c);
            x = nx;
            y = ny;
            c = nc;
        }
        scan.len() - before
    }

    /// One step forward along the scan walk (mode-aware).
    fn forward_step(&self, x: i32, y: i32, cursor: usize) -> (i32, i32, usize) {
        if self.mode == ScanMode::Orthographic {
            return match self.octant {
                ScanOctant::O1 | ScanOctant::O8 => (x, y + 1, cursor),
                ScanOctant::O2 => (x - 1, y, cursor),
                ScanOctant::O7 => (x + 1, y, cursor),
            };
        }
        let st = self.steps[cursor];
        let nc = if cursor + 1 >= self.steps.len() { 0 } else { cursor + 1 };
        match self.octant {
            ScanOctant::O1 => (if st { x - 1 } else { x }, y + 1, nc),
            ScanOctant::O2 => (x - 1, if st { y + 1 } else { y }, nc),
            ScanOctant::O7 => (x + 1, if st { y + 1 } else { y }, nc),
            ScanOctant::O8 => (if st { x + 1 } else { x }, y + 1, nc),
        }
    }

    /// Appends the central scan to `scan` and returns the new size.
    pub fn first(&self, scan: &mut Vec<Pt2i>) -> usize {
        self.emit(self.lcx, self.lcy, self.lst2, scan);
        scan.len()
    }

    /// Advances to the next scan on the left and appends it.
    ///
    /// Returns the new size of `scan`; an empty scan (size 0 with clearance
    /// on) signals the edge of the scan area.
    pub fn next_on_left(&mut self, scan: &mut Vec<Pt2i>) -> usize {
        if self.clearance {
            scan.clear();
        }
        match self.octant {
            ScanOctant::O1 | ScanOctant::O8 => self.lcx -= 1,
            ScanOctant::O2 => self.lcy -= 1,
            ScanOctant::O7 => self.lcy += 1,
        }
        if self.mode == ScanMode::Orthographic && !self.start_in_area(self.lcx, self.lcy) {
            return 0;
        }
        let (x, y, c) = self.resync(self.lcx, self.lcy, self.lst2);
        self.lcx = x;
        self.lcy = y;
        self.lst2 = c;
        self.emit(self.lcx, self.lcy, self.lst2, scan);
        scan.len()
    }

    /// Advances to the next scan on the right and appends it.
    pub fn next_on_right(&mut self, scan: &mut Vec<Pt2i>) -> usize {
        if self.clearance {
            scan.clear();
        }
        match self.octant {
            ScanOctant::O1 | ScanOctant::O8 => self.rcx += 1,
            ScanOctant::O2 => self.rcy += 1,
            ScanOctant::O7 => self.rcy -= 1,
        }
        if self.mode == ScanMode::Orthographic && !self.start_in_area(self.rcx, self.rcy) {
            return 0;
        }
        let (x, y, c) = self.resync(self.rcx, self.rcy, self.rst2);
        self.rcx = x;
        self.rcy = y;
        self.rst2 = c;
        self.emit(self.rcx, self.rcy, self.rst2, scan);
        scan.len()
    }

    /// Jumps `skip - 1` scans leftward and appends the following scan.
    pub fn skip_left(&mut self, scan: &mut Vec<Pt2i>, skip: i32) -> usize {
        if self.mode == ScanMode::Orthographic {
            if self.clearance {
                scan.clear();
            }
            match self.octant {
                ScanOctant::O1 | ScanOctant::O8 => self.lcx -= skip,
                ScanOctant::O2 => self.lcy -= skip,
                ScanOctant::O7 => self.lcy += skip,
            }
            if !self.start_in_area(self.lcx, self.lcy) {
                return 0;
            }
            let (x, y, c) = self.resync(self.lcx, self.lcy, self.lst2);
            self.lcx = x;
            self.lcy = y;
            self.lst2 = c;
            self.emit(self.lcx, self.lcy, self.lst2, scan);
            return scan.len();
        }
        let mut scratch = Vec::new();
        for _ in 1..skip {
            self.next_on_left(&mut scratch);
            scratch.clear();
        }
        self.next_on_left(scan)
    }

    /// Jumps `skip - 1` scans rightward and appends the following scan.
    pub fn skip_right(&mut self, scan: &mut Vec<Pt2i>, skip: i32) -> usize {
        if self.mode == ScanMode::Orthographic {
            if self.clearance {
                scan.clear();
            }
            match self.octant {
                ScanOctant::O1 | ScanOctant::O8 => self.rcx += skip,
                ScanOctant::O2 => self.rcy += skip,
                ScanOctant::O7 => self.rcy -= skip,
            }
            if !self.start_in_area(self.rcx, self.rcy) {
                return 0;
            }
            let (x, y, c) = self.resync(self.rcx, self.rcy, self.rst2);
            self.rcx = x;
            self.rcy = y;
            self.rst2 = c;
            self.emit(self.rcx, self.rcy, self.rst2, scan);
            return scan.len();
        }
        let mut scratch = Vec::new();
        for _ in 1..skip {
            self.next_on_right(&mut scratch);
            scratch.clear();
        }
        self.next_on_right(scan)
    }

    fn start_in_area(&self, x: i32, y: i32) -> bool {
        match self.octant {
            ScanOctant::O1 | ScanOctant::O8 => x >= self.xmin && x < self.xmax,
            ScanOctant::O2 | ScanOctant::O7 => y >= self.ymin && y < self.ymax,
        }
    }

    /// Brings a scan start back onto the lower support line after a side
    /// move or a rebind (corridor resync).
    fn resync(&self, sx: i32, sy: i32, cursor: usize) -> (i32, i32, usize) {
        let (mut x, mut y, mut c) = (sx, sy, cursor);
        if self.mode == ScanMode::Orthographic {
            // move only along the scan direction, no pattern
            if self.octant.decreasing() {
                while self.in_area_loose(x, y) && self.value(x, y) > self.dlc1 {
                    let (nx, ny, _) = self.forward_step(x, y, c);
                    x = nx;
                    y = ny;
                }
                while self.in_area_loose(x, y) && self.value(x, y) < self.dlc1 {
                    let (nx, ny) = self.ortho_back(x, y);
                    x = nx;
                    y = ny;
                }
            } else {
                while self.in_area_loose(x, y) && self.value(x, y) < self.dlc1 {
                    let (nx, ny, _) = self.forward_step(x, y, c);
                    x = nx;
                    y = ny;
                }
                while self.in_area_loose(x, y) && self.value(x, y) > self.dlc1 {
                    let (nx, ny) = self.ortho_back(x, y);
                    x = nx;
                    y = ny;
                }
            }
            return (x, y, c);
        }

        if self.octant.decreasing() {
            // forward decreases the support value
            while self.in_area_loose(x, y) && self.value(x, y) > self.dlc1 {
                let (nx, ny, nc) = self.forward_step(x, y, c);
                x = nx;
                y = ny;
                c = nc;
            }
            while self.in_area_loose(x, y) && self.value(x, y) < self.dlc1 {
                let (nx, ny, nc) = self.backward_step(x, y, c);
                x = nx;
                y = ny;
                c = nc;
            }
        } else {
            while self.in_area_loose(x, y) && self.value(x, y) < self.dlc1 {
                let (nx, ny, nc) = self.forward_step(x, y, c);
                x = nx;
                y = ny;
                c = nc;
            }
            while self.in_area_loose(x, y) && self.value(x, y) > self.dlc1 {
                let (nx, ny, nc) = self.backward_step(x, y, c);
                x = nx;
                y = ny;
                c = nc;
            }
        }
        (x, y, c)
    }

    /// Loose area guard for the resync loops; one cell of slack keeps the
    /// walk finite when the corridor leaves the clip box.
    fn in_area_loose(&self, x: i32, y: i32) -> bool {
        x >= self.xmin - 1 && x <= self.xmax && y >= self.ymin - 1 && y <= self.ymax
    }

    fn ortho_back(&self, x: i32, y: i32) -> (i32, i32) {
        match self.octant {
            ScanOctant::O1 | ScanOctant::O8 => (x, y - 1),
            ScanOctant::O2 => (x + 1, y),
            ScanOctant::O7 => (x - 1, y),
        }
    }

    fn backward_step(&self, x: i32, y: i32, cursor: usize) -> (i32, i32, usize) {
        let nc = if cursor == 0 { self.steps.len() - 1 } else { cursor - 1 };
        let st = self.steps[nc];
        match self.octant {
            ScanOctant::O1 => (if st { x + 1 } else { x }, y - 1, nc),
            ScanOctant::O2 => (x + 1, if st { y - 1 } else { y }, nc),
            ScanOctant::O7 => (x - 1, if st { y - 1 } else { y }, nc),
            ScanOctant::O8 => (if st { x - 1 } else { x }, y - 1, nc),
        }
    }

    /// Re-centers the strip on the digital line `a*x + b*y = c`.
    ///
    /// The strip width is recomputed from the stored template so that its
    /// Euclidean thickness is preserved under the new slope. Only available
    /// in adaptive and orthographic modes.
    pub fn bind_to(&mut self, a: i32, b: i32, c: i32) {
        debug_assert!(
            self.mode != ScanMode::Incremental,
            "bind_to requires an adaptive or orthographic scanner"
        );
        let (mut a, mut b, mut c) = (a, b, c);
        if a < 0 {
            a = -a;
            b = -b;
            c = -c;
        }
        self.dla = a;
        self.dlb = b;
        let old_b = self.templ_b.abs();
        let old_n1 = self.templ_a + old_b;
        let old_ninf = old_b.max(self.templ_a);
        let new_a = a.abs();
        let new_b = b.abs();
        let new_n1 = new_a + new_b;
        let new_ninf = new_b.max(new_a);
        let nu = if new_n1 * old_ninf > old_n1 * new_ninf {
            (self.templ_nu * new_n1) / old_n1
        } else {
            (self.templ_nu * new_ninf) / old_ninf
        };
        // keep the support inequations oriented with the octant
        let flip = match self.octant {
            ScanOctant::O8 => self.dlb < 0,
            ScanOctant::O1 => self.dlb > 0,
            ScanOctant::O2 | ScanOctant::O7 => false,
        };
        if flip {
            self.dla = -self.dla;
            self.dlb = -self.dlb;
            c = -c;
        }
        if self.octant.decreasing() {
            self.dlc1 = c + nu / 2;
            self.dlc2 = c - nu / 2;
        } else {
            self.dlc1 = c - nu / 2;
            self.dlc2 = c + nu / 2;
        }
    }

    /// Returns the scanner coordinates (scan index, position in scan) of a
    /// lattice point, or `None` when the point is not covered.
    ///
    /// Positive indices number scans on the left side, negative on the
    /// right, matching the enumeration order of `next_on_left` /
    /// `next_on_right`.
    pub fn locate(&self, pt: Pt2i) -> Option<Pt2i> {
        // replay the enumeration from the central scan state
        let mut probe = self.clone();
        probe.clearance = true;
        probe.lcx = self.ccx;
        probe.lcy = self.ccy;
        probe.lst2 = self.cst2;
        probe.rcx = self.ccx;
        probe.rcy = self.ccy;
        probe.rst2 = self.cst2;
        let mut scan = Vec::new();
        probe.first(&mut scan);
        if let Some(off) = scan.iter().position(|p| *p == pt) {
            return Some(Pt2i::new(0, off as i32));
        }
        let mut left = probe.clone();
        let mut num = 0;
        loop {
            num += 1;
            scan.clear();
            if left.next_on_left(&mut scan) == 0 {
                break;
            }
            if let Some(off) = scan.iter().position(|p| *p == pt) {
                return Some(Pt2i::new(num, off as i32));
            }
            if num > (self.xmax - self.xmin) + (self.ymax - self.ymin) {
                break;
            }
        }
        let mut right = probe;
        num = 0;
        loop {
            num += 1;
            scan.clear();
            if right.next_on_right(&mut scan) == 0 {
                break;
            }
            if let Some(off) = scan.iter().position(|p| *p == pt) {
                return Some(Pt2i::new(-num, off as i32));
            }
            if num > (self.xmax - self.xmin) + (self.ymax - self.ymin) {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScannerProvider;

    fn chessboard_connected(scan: &[Pt2i]) {
        for w in scan.windows(2) {
            assert_eq!(
                w[0].chessboard(w[1]),
                1,
                "consecutive scan points must differ by chessboard distance 1"
            );
        }
    }

    #[test]
    fn test_central_scan_is_the_stroke() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 20, 20);
        let sc = provider.scanner(Pt2i::new(0, 0), Pt2i::new(10, 7), false);
        let mut scan = Vec::new();
        sc.first(&mut scan);
        assert_eq!(scan.len(), 11, "naive line of slope 7/10 has 11 points");
        assert_eq!(scan[0], Pt2i::new(0, 0));
        assert_eq!(scan[10], Pt2i::new(10, 7));
        chessboard_connected(&scan);
        // midpoint of the stroke lies on the central scan
        assert!(scan.contains(&Pt2i::new(5, 3)) || scan.contains(&Pt2i::new(5, 4)));
    }

    #[test]
    fn test_side_scans_are_parallel_and_connected() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 30, 30);
        let mut sc = provider.scanner(Pt2i::new(2, 3), Pt2i::new(20, 14), false);
        let mut scan = Vec::new();
        let n0 = sc.first(&mut scan);
        assert!(n0 > 0);
        for _ in 0..4 {
            let prev = scan.clone();
            let n = sc.next_on_left(&mut scan);
            if n == 0 {
                break;
            }
            chessboard_connected(&scan);
            assert_ne!(prev, scan);
        }
        for _ in 0..4 {
            let n = sc.next_on_right(&mut scan);
            if n == 0 {
                break;
            }
            chessboard_connected(&scan);
        }
    }

    #[test]
    fn test_all_octants_produce_scans() {
        let strokes = [
            (Pt2i::new(5, 5), Pt2i::new(15, 8)),  // shallow up-right
            (Pt2i::new(5, 5), Pt2i::new(8, 15)),  // steep up-right
            (Pt2i::new(15, 5), Pt2i::new(5, 8)),  // shallow up-left
            (Pt2i::new(15, 5), Pt2i::new(12, 15)), // steep up-left
        ];
        for (p1, p2) in strokes {
            let mut provider = ScannerProvider::new();
            provider.set_area(0, 0, 24, 24);
            let mut sc = provider.scanner(p1, p2, false);
            let mut scan = Vec::new();
            let n = sc.first(&mut scan);
            assert!(n > 0, "central scan empty for stroke {:?}-{:?}", p1, p2);
            chessboard_connected(&scan);
            assert!(scan.contains(&p1) || scan.contains(&p2), "stroke end missing");
            for _ in 0..3 {
                scan.clear();
                if sc.next_on_left(&mut scan) == 0 {
                    break;
                }
                chessboard_connected(&scan);
            }
            for _ in 0..3 {
                scan.clear();
                if sc.next_on_right(&mut scan) == 0 {
                    break;
                }
                chessboard_connected(&scan);
            }
        }
    }

    #[test]
    fn test_scans_partition_without_overlap() {
        // successive left scans never repeat points
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 40, 40);
        let mut sc = provider.scanner(Pt2i::new(5, 10), Pt2i::new(25, 16), false);
        let mut seen = std::collections::HashSet::new();
        let mut scan = Vec::new();
        sc.first(&mut scan);
        for p in &scan {
            assert!(seen.insert(*p));
        }
        for _ in 0..6 {
            scan.clear();
            if sc.next_on_left(&mut scan) == 0 {
                break;
            }
            for p in &scan {
                assert!(seen.insert(*p), "point {:?} produced twice", p);
            }
        }
        for _ in 0..6 {
            scan.clear();
            if sc.next_on_right(&mut scan) == 0 {
                break;
            }
            for p in &scan {
                assert!(seen.insert(*p), "point {:?} produced twice", p);
            }
        }
    }

    #[test]
    fn test_locate_agrees_with_enumeration() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 30, 30);
        let mut sc = provider.scanner(Pt2i::new(3, 4), Pt2i::new(18, 12), false);
        let probe = sc.clone();
        let mut scan = Vec::new();
        sc.first(&mut scan);
        let p = scan[scan.len() / 2];
        assert_eq!(probe.locate(p), Some(Pt2i::new(0, (scan.len() / 2) as i32)));

        scan.clear();
        sc.next_on_left(&mut scan);
        scan.clear();
        sc.next_on_left(&mut scan);
        if !scan.is_empty() {
            let q = scan[0];
            assert_eq!(probe.locate(q), Some(Pt2i::new(2, 0)));
        }
    }

    #[test]
    fn test_orthographic_scans_are_rows_or_columns() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 30, 30);
        provider.set_ortho(true);
        let mut sc = provider.scanner(Pt2i::new(4, 4), Pt2i::new(7, 20), false);
        assert_eq!(sc.mode(), ScanMode::Orthographic);
        let mut scan = Vec::new();
        sc.first(&mut scan);
        assert!(!scan.is_empty());
        let x0 = scan[0].x();
        for p in &scan {
            assert_eq!(p.x(), x0, "steep orthographic scan must be a column");
        }
        // skip jumps several columns at once
        scan.clear();
        let n = sc.skip_left(&mut scan, 3);
        if n > 0 {
            assert_eq!(scan[0].x(), x0 - 3);
        }
    }

    #[test]
    fn test_adaptive_bind_to_keeps_scanning() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 40, 40);
        let mut sc = provider.scanner(Pt2i::new(5, 10), Pt2i::new(25, 14), true);
        assert_eq!(sc.mode(), ScanMode::Adaptive);
        let mut scan = Vec::new();
        sc.first(&mut scan);
        assert!(!scan.is_empty());
        // rebind on a slightly shifted central line
        let (a, b) = (4, 20);
        let c = a * 15 + b * 12;
        sc.bind_to(a, b, c);
        scan.clear();
        let n = sc.next_on_left(&mut scan);
        assert!(n > 0, "scanner must keep producing scans after a rebind");
        for w in scan.windows(2) {
            assert_eq!(w[0].chessboard(w[1]), 1);
        }
    }
}
