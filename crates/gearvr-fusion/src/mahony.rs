use glam::{DQuat, DVec3};

/// Error-feedback orientation filter (Mahony's complementary algorithm).
///
/// Correction comes from the cross product between measured and estimated
/// field directions, applied through proportional and integral gains. The
/// integral term accumulates a gyroscope bias estimate.
#[derive(Debug, Clone)]
pub struct Mahony {
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
    two_kp: f64,
    two_ki: f64,
    integral_fb: DVec3,
    sample_interval: f64,
}

impl Mahony {
    /// `sample_interval` in seconds. `ki` of 0 disables the integral term
    /// and forces the accumulator back to zero on every update.
    pub fn new(sample_interval: f64, kp: f64, ki: f64) -> Self {
        Self {
            q0: 1.0,
            q1: 0.0,
            q2: 0.0,
            q3: 0.0,
            two_kp: 2.0 * kp,
            two_ki: 2.0 * ki,
            integral_fb: DVec3::ZERO,
            sample_interval,
        }
    }

    pub fn quaternion(&self) -> DQuat {
        DQuat::from_xyzw(self.q1, self.q2, self.q3, self.q0)
    }

    /// Current integral feedback (gyro bias estimate scaled by ki).
    pub fn integral_feedback(&self) -> DVec3 {
        self.integral_fb
    }

    /// One filter step; same contract as the gradient-descent variant.
    pub fn update(&mut self, gyro: DVec3, accel: DVec3, mag: Option<DVec3>, dt: Option<f64>) {
        let dt = dt.filter(|d| *d != 0.0).unwrap_or(self.sample_interval);
        match mag {
            Some(m) if m != DVec3::ZERO => self.update_marg(gyro, accel, m, dt),
            _ => self.update_imu(gyro, accel, dt),
        }
    }

    fn update_imu(&mut self, gyro: DVec3, accel: DVec3, dt: f64) {
        let (mut gx, mut gy, mut gz) = (gyro.x, gyro.y, gyro.z);

        if accel != DVec3::ZERO {
            let recip_norm =
                (accel.x * accel.x + accel.y * accel.y + accel.z * accel.z).powf(-0.5);
            let ax = accel.x * recip_norm;
            let ay = accel.y * recip_norm;
            let az = accel.z * recip_norm;

            // Estimated direction of gravity
            let half_vx = self.q1 * self.q3 - self.q0 * self.q2;
            let half_vy = self.q0 * self.q1 + self.q2 * self.q3;
            let half_vz = self.q0 * self.q0 - 0.5 + self.q3 * self.q3;

            // Error is the cross product between estimated and measured
            // direction of gravity
            let half_ex = ay * half_vz - az * half_vy;
            let half_ey = az * half_vx - ax * half_vz;
            let half_ez = ax * half_vy - ay * half_vx;

            let (fx, fy, fz) = self.feedback(half_ex, half_ey, half_ez, dt);
            gx += fx;
            gy += fy;
            gz += fz;
        }

        self.integrate(gx, gy, gz, dt);
    }

    fn update_marg(&mut self, gyro: DVec3, accel: DVec3, mag: DVec3, dt: f64) {
        let (mut gx, mut gy, mut gz) = (gyro.x, gyro.y, gyro.z);

        if accel != DVec3::ZERO {
            let recip_norm =
                (accel.x * accel.x + accel.y * accel.y + accel.z * accel.z).powf(-0.5);
            let ax = accel.x * recip_norm;
            let ay = accel.y * recip_norm;
            let az = accel.z * recip_norm;

            let recip_norm = (mag.x * mag.x + mag.y * mag.y + mag.z * mag.z).powf(-0.5);
            let mx = mag.x * recip_norm;
            let my = mag.y * recip_norm;
            let mz = mag.z * recip_norm;

            let q0q0 = self.q0 * self.q0;
            let q0q1 = self.q0 * self.q1;
            let q0q2 = self.q0 * self.q2;
            let q0q3 = self.q0 * self.q3;
            let q1q1 = self.q1 * self.q1;
            let q1q2 = self.q1 * self.q2;
            let q1q3 = self.q1 * self.q3;
            let q2q2 = self.q2 * self.q2;
            let q2q3 = self.q2 * self.q3;
            let q3q3 = self.q3 * self.q3;

            // Reference direction of Earth's magnetic field
            let hx = 2.0 * (mx * (0.5 - q2q2 - q3q3) + my * (q1q2 - q0q3) + mz * (q1q3 + q0q2));
            let hy = 2.0 * (mx * (q1q2 + q0q3) + my * (0.5 - q1q1 - q3q3) + mz * (q2q3 - q0q1));
            let bx = (hx * hx + hy * hy).sqrt();
            let bz = 2.0 * (mx * (q1q3 - q0q2) + my * (q2q3 + q0q1) + mz * (0.5 - q1q1 - q2q2));

            // Estimated direction of gravity and magnetic field
            let half_vx = q1q3 - q0q2;
            let half_vy = q0q1 + q2q3;
            let half_vz = q0q0 - 0.5 + q3q3;
            let half_wx = bx * (0.5 - q2q2 - q3q3) + bz * (q1q3 - q0q2);
            let half_wy = bx * (q1q2 - q0q3) + bz * (q0q1 + q2q3);
            let half_wz = bx * (q0q2 + q1q3) + bz * (0.5 - q1q1 - q2q2);

            // Error is the sum of the cross products between estimated and
            // measured direction of the two field vectors
            let half_ex = (ay * half_vz - az * half_vy) + (my * half_wz - mz * half_wy);
            let half_ey = (az * half_vx - ax * half_vz) + (mz * half_wx - mx * half_wz);
            let half_ez = (ax * half_vy - ay * half_vx) + (mx * half_wy - my * half_wx);

            let (fx, fy, fz) = self.feedback(half_ex, half_ey, half_ez, dt);
            gx += fx;
            gy += fy;
            gz += fz;
        }

        self.integrate(gx, gy, gz, dt);
    }

    // Integral feedback accumulates only while ki is enabled; otherwise the
    // accumulator is cleared to prevent windup.
    fn feedback(&mut self, half_ex: f64, half_ey: f64, half_ez: f64, dt: f64) -> (f64, f64, f64) {
        let mut fx = 0.0;
        let mut fy = 0.0;
        let mut fz = 0.0;

        if self.two_ki > 0.0 {
            self.integral_fb.x += self.two_ki * half_ex * dt;
            self.integral_fb.y += self.two_ki * half_ey * dt;
            self.integral_fb.z += self.two_ki * half_ez * dt;
            fx += self.integral_fb.x;
            fy += self.integral_fb.y;
            fz += self.integral_fb.z;
        } else {
            self.integral_fb = DVec3::ZERO;
        }

        fx += self.two_kp * half_ex;
        fy += self.two_kp * half_ey;
        fz += self.two_kp * half_ez;
        (fx, fy, fz)
    }

    fn integrate(&mut self, gx: f64, gy: f64, gz: f64, dt: f64) {
        // Pre-multiply common factors
        let gx = gx * (0.5 * dt);
        let gy = gy * (0.5 * dt);
        let gz = gz * (0.5 * dt);
        let qa = self.q0;
        let qb = self.q1;
        let qc = self.q2;
        self.q0 += -qb * gx - qc * gy - self.q3 * gz;
        self.q1 += qa * gx + qc * gz - self.q3 * gy;
        self.q2 += qa * gy - qb * gz + self.q3 * gx;
        self.q3 += qa * gz + qb * gy - qc * gx;

        let recip_norm = (self.q0 * self.q0
            + self.q1 * self.q1
            + self.q2 * self.q2
            + self.q3 * self.q3)
            .powf(-0.5);
        self.q0 *= recip_norm;
        self.q1 *= recip_norm;
        self.q2 *= recip_norm;
        self.q3 *= recip_norm;
    }
}
