use std::collections::VecDeque;

use itertools::Itertools;
use varisat::{ExtendFormula, Lit};

use crate::constraint::Comparison;

/// Writes the CNF of one constraint into a formula. Every clause carries the
/// negated guard, so the constraint only binds while the guard is assumed.
pub(crate) struct GuardedCnf<'f, F> {
    formula: &'f mut F,
    guard: Lit,
}

fn bit(value: u64, index: usize) -> bool {
    index < u64::BITS as usize && (value >> index) & 1 == 1
}

impl<'f, F: ExtendFormula> GuardedCnf<'f, F> {
    pub(crate) fn new(formula: &'f mut F, guard: Lit) -> Self {
        GuardedCnf { formula, guard }
    }

    fn fresh(&mut self) -> Lit {
        Lit::from_var(self.formula.new_var(), true)
    }

    fn clause(&mut self, lits: &[Lit]) {
        let mut clause = Vec::with_capacity(lits.len() + 1);
        clause.extend_from_slice(lits);
        clause.push(!self.guard);
        self.formula.add_clause(&clause);
    }

    /// Encodes `Σ coef·lit <cmp> degree` with positive coefficients.
    pub(crate) fn linear(&mut self, terms: &[(u64, Lit)], comparison: Comparison, degree: u64) {
        if terms.iter().all(|&(coef, _)| coef == 1) {
            let lits: Vec<Lit> = terms.iter().map(|&(_, lit)| lit).collect();
            let k = degree as usize;
            match comparison {
                Comparison::Equal => self.exactly_k(&lits, k),
                Comparison::AtMost => self.at_most_k(&lits, k),
                Comparison::AtLeast => self.at_least_k(&lits, k),
            }
        } else {
            let sum = self.binary_sum(terms);
            match comparison {
                Comparison::Equal => self.sum_equals(&sum, degree),
                Comparison::AtMost => self.sum_at_most(&sum, degree),
                Comparison::AtLeast => self.sum_at_least(&sum, degree),
            }
        }
    }

    fn exactly_k(&mut self, lits: &[Lit], k: usize) {
        self.at_most_k(lits, k);
        self.at_least_k(lits, k);
    }

    fn at_most_k(&mut self, lits: &[Lit], k: usize) {
        if k >= lits.len() {
            return;
        }
        if k == 0 {
            for &lit in lits {
                self.clause(&[!lit]);
            }
            return;
        }

        if lits.len() <= 10 {
            // Small constraints: forbid every set of k + 1 true literals.
            for combo in lits.iter().copied().combinations(k + 1) {
                let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
                self.clause(&clause);
            }
        } else {
            self.sequential_counter(lits, k);
        }
    }

    fn at_least_k(&mut self, lits: &[Lit], k: usize) {
        if k == 0 {
            return;
        }
        if k > lits.len() {
            self.clause(&[]);
            return;
        }

        if lits.len() <= 10 {
            // Every set of n - k + 1 literals must contain a true one.
            for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
                self.clause(&combo);
            }
        } else {
            // At least k true is at most n - k false.
            let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
            self.at_most_k(&negated, lits.len() - k);
        }
    }

    /// Sequential counter for `Σ lits <= k`, `0 < k < n`.
    fn sequential_counter(&mut self, lits: &[Lit], k: usize) {
        let n = lits.len();

        // r[i][j]: at least j + 1 of lits[..=i] are true.
        let mut r: Vec<Vec<Lit>> = Vec::with_capacity(n - 1);
        for _ in 0..n - 1 {
            let mut row = Vec::with_capacity(k);
            for _ in 0..k {
                row.push(self.fresh());
            }
            r.push(row);
        }

        self.clause(&[!lits[0], r[0][0]]);
        for j in 1..k {
            self.clause(&[!r[0][j]]);
        }

        for i in 1..n - 1 {
            self.clause(&[!lits[i], r[i][0]]);
            self.clause(&[!r[i - 1][0], r[i][0]]);
            for j in 1..k {
                self.clause(&[!lits[i], !r[i - 1][j - 1], r[i][j]]);
                self.clause(&[!r[i - 1][j], r[i][j]]);
            }
            self.clause(&[!lits[i], !r[i - 1][k - 1]]);
        }

        self.clause(&[!lits[n - 1], !r[n - 2][k - 1]]);
    }

    /// Adds up the weighted literals column by column with full and half
    /// adders. Returns the sum's binary digits, least significant first;
    /// `None` is a digit that is always zero.
    fn binary_sum(&mut self, terms: &[(u64, Lit)]) -> Vec<Option<Lit>> {
        let mut columns: Vec<VecDeque<Lit>> = Vec::new();
        for &(coef, lit) in terms {
            for index in (0..u64::BITS as usize).filter(|&i| bit(coef, i)) {
                if columns.len() <= index {
                    columns.resize_with(index + 1, VecDeque::new);
                }
                columns[index].push_back(lit);
            }
        }

        let mut digits = Vec::with_capacity(columns.len());
        let mut index = 0;
        while index < columns.len() {
            let mut column = std::mem::take(&mut columns[index]);
            let mut carries = Vec::new();
            loop {
                let (sum, carry) = match column.len() {
                    0 | 1 => break,
                    2 => {
                        let pair: Vec<Lit> = column.drain(..2).collect();
                        self.half_adder(pair[0], pair[1])
                    }
                    _ => {
                        let trio: Vec<Lit> = column.drain(..3).collect();
                        self.full_adder(trio[0], trio[1], trio[2])
                    }
                };
                column.push_back(sum);
                carries.push(carry);
            }
            digits.push(column.pop_front());
            if !carries.is_empty() {
                if columns.len() <= index + 1 {
                    columns.resize_with(index + 2, VecDeque::new);
                }
                columns[index + 1].extend(carries);
            }
            index += 1;
        }
        digits
    }

    fn half_adder(&mut self, a: Lit, b: Lit) -> (Lit, Lit) {
        let sum = self.fresh();
        let carry = self.fresh();
        // sum <-> a xor b
        self.clause(&[!a, !b, !sum]);
        self.clause(&[a, b, !sum]);
        self.clause(&[!a, b, sum]);
        self.clause(&[a, !b, sum]);
        // carry <-> a and b
        self.clause(&[!a, !b, carry]);
        self.clause(&[a, !carry]);
        self.clause(&[b, !carry]);
        (sum, carry)
    }

    fn full_adder(&mut self, a: Lit, b: Lit, c: Lit) -> (Lit, Lit) {
        let sum = self.fresh();
        let carry = self.fresh();
        // sum <-> a xor b xor c
        self.clause(&[!a, !b, !c, sum]);
        self.clause(&[!a, b, c, sum]);
        self.clause(&[a, !b, c, sum]);
        self.clause(&[a, b, !c, sum]);
        self.clause(&[a, b, c, !sum]);
        self.clause(&[a, !b, !c, !sum]);
        self.clause(&[!a, b, !c, !sum]);
        self.clause(&[!a, !b, c, !sum]);
        // carry <-> majority(a, b, c)
        self.clause(&[!a, !b, carry]);
        self.clause(&[!a, !c, carry]);
        self.clause(&[!b, !c, carry]);
        self.clause(&[a, b, !carry]);
        self.clause(&[a, c, !carry]);
        self.clause(&[b, c, !carry]);
        (sum, carry)
    }

    fn sum_equals(&mut self, digits: &[Option<Lit>], k: u64) {
        if (digits.len()..u64::BITS as usize).any(|i| bit(k, i)) {
            self.clause(&[]);
            return;
        }
        for (i, digit) in digits.iter().enumerate() {
            match (bit(k, i), *digit) {
                (true, Some(d)) => self.clause(&[d]),
                (true, None) => self.clause(&[]),
                (false, Some(d)) => self.clause(&[!d]),
                (false, None) => {}
            }
        }
    }

    /// For every zero digit of `k`: that digit set while all higher one-digits
    /// are set would make the sum exceed `k`.
    fn sum_at_most(&mut self, digits: &[Option<Lit>], k: u64) {
        if (digits.len()..u64::BITS as usize).any(|i| bit(k, i)) {
            return;
        }
        'digits: for (i, digit) in digits.iter().enumerate() {
            let Some(d) = *digit else { continue };
            if bit(k, i) {
                continue;
            }
            let mut clause = vec![!d];
            for (j, higher) in digits.iter().enumerate().skip(i + 1) {
                if bit(k, j) {
                    match higher {
                        Some(h) => clause.push(!*h),
                        None => continue 'digits,
                    }
                }
            }
            self.clause(&clause);
        }
    }

    /// For every one digit of `k`: that digit clear while all higher
    /// zero-digits are clear would make the sum fall short of `k`.
    fn sum_at_least(&mut self, digits: &[Option<Lit>], k: u64) {
        if (digits.len()..u64::BITS as usize).any(|i| bit(k, i)) {
            self.clause(&[]);
            return;
        }
        for i in (0..digits.len()).filter(|&i| bit(k, i)) {
            let clause: Vec<Lit> = digits
                .iter()
                .enumerate()
                .skip(i)
                .filter(|&(j, _)| j == i || !bit(k, j))
                .filter_map(|(_, digit)| *digit)
                .collect();
            self.clause(&clause);
        }
    }
}
