/// L2-normalize a vector in place. Vectors with zero norm are left untouched.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in v.iter_mut() {
            *value /= norm;
        }
    }
}
