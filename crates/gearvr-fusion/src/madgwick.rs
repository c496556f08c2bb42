use glam::{DQuat, DVec3};

/// Gradient-descent orientation filter (Madgwick's IMU/AHRS algorithm).
///
/// Gyroscope integration corrected toward the measured gravity direction,
/// and toward magnetic heading when a magnetometer sample is present.
#[derive(Debug, Clone)]
pub struct Madgwick {
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
    beta: f64,
    sample_interval: f64,
}

impl Madgwick {
    /// `sample_interval` in seconds; `beta` is the correction strength.
    /// Larger beta converges faster but follows accelerometer noise.
    pub fn new(sample_interval: f64, beta: f64) -> Self {
        Self {
            q0: 1.0,
            q1: 0.0,
            q2: 0.0,
            q3: 0.0,
            beta,
            sample_interval,
        }
    }

    pub fn quaternion(&self) -> DQuat {
        DQuat::from_xyzw(self.q1, self.q2, self.q3, self.q0)
    }

    /// One filter step. `gyro` in rad/s, `accel` in any consistent unit,
    /// `mag` likewise. A missing or zero magnetometer falls back to the
    /// six-axis path; a zero accelerometer skips the corrective step. A
    /// nonzero `dt` overrides the configured interval for this call only.
    pub fn update(&mut self, gyro: DVec3, accel: DVec3, mag: Option<DVec3>, dt: Option<f64>) {
        let dt = dt.filter(|d| *d != 0.0).unwrap_or(self.sample_interval);
        match mag {
            Some(m) if m != DVec3::ZERO => self.update_marg(gyro, accel, m, dt),
            _ => self.update_imu(gyro, accel, dt),
        }
    }

    fn update_imu(&mut self, gyro: DVec3, accel: DVec3, dt: f64) {
        let (q0, q1, q2, q3) = (self.q0, self.q1, self.q2, self.q3);
        let (gx, gy, gz) = (gyro.x, gyro.y, gyro.z);

        // Rate of change of quaternion from gyroscope
        let mut q_dot1 = 0.5 * (-q1 * gx - q2 * gy - q3 * gz);
        let mut q_dot2 = 0.5 * (q0 * gx + q2 * gz - q3 * gy);
        let mut q_dot3 = 0.5 * (q0 * gy - q1 * gz + q3 * gx);
        let mut q_dot4 = 0.5 * (q0 * gz + q1 * gy - q2 * gx);

        // Corrective step only with a usable accelerometer sample
        if accel != DVec3::ZERO {
            let recip_norm =
                (accel.x * accel.x + accel.y * accel.y + accel.z * accel.z).powf(-0.5);
            let ax = accel.x * recip_norm;
            let ay = accel.y * recip_norm;
            let az = accel.z * recip_norm;

            let two_q0 = 2.0 * q0;
            let two_q1 = 2.0 * q1;
            let two_q2 = 2.0 * q2;
            let two_q3 = 2.0 * q3;
            let four_q0 = 4.0 * q0;
            let four_q1 = 4.0 * q1;
            let four_q2 = 4.0 * q2;
            let eight_q1 = 8.0 * q1;
            let eight_q2 = 8.0 * q2;
            let q0q0 = q0 * q0;
            let q1q1 = q1 * q1;
            let q2q2 = q2 * q2;
            let q3q3 = q3 * q3;

            // Gradient descent corrective step
            let mut s0 = four_q0 * q2q2 + two_q2 * ax + four_q0 * q1q1 - two_q1 * ay;
            let mut s1 = four_q1 * q3q3 - two_q3 * ax + 4.0 * q0q0 * q1 - two_q0 * ay - four_q1
                + eight_q1 * q1q1
                + eight_q1 * q2q2
                + four_q1 * az;
            let mut s2 = 4.0 * q0q0 * q2 + two_q0 * ax + four_q2 * q3q3 - two_q3 * ay - four_q2
                + eight_q2 * q1q1
                + eight_q2 * q2q2
                + four_q2 * az;
            let mut s3 = 4.0 * q1q1 * q3 - two_q1 * ax + 4.0 * q2q2 * q3 - two_q2 * ay;

            // A zero gradient (gravity already aligned) has no direction to
            // normalise; leave the gyroscope prediction untouched.
            let step_norm = s0 * s0 + s1 * s1 + s2 * s2 + s3 * s3;
            if step_norm > 0.0 {
                let recip_norm = step_norm.powf(-0.5);
                s0 *= recip_norm;
                s1 *= recip_norm;
                s2 *= recip_norm;
                s3 *= recip_norm;

                q_dot1 -= self.beta * s0;
                q_dot2 -= self.beta * s1;
                q_dot3 -= self.beta * s2;
                q_dot4 -= self.beta * s3;
            }
        }

        self.integrate([q_dot1, q_dot2, q_dot3, q_dot4], dt);
    }

    fn update_marg(&mut self, gyro: DVec3, accel: DVec3, mag: DVec3, dt: f64) {
        let (q0, q1, q2, q3) = (self.q0, self.q1, self.q2, self.q3);
        let (gx, gy, gz) = (gyro.x, gyro.y, gyro.z);

        // Rate of change of quaternion from gyroscope
        let mut q_dot1 = 0.5 * (-q1 * gx - q2 * gy - q3 * gz);
        let mut q_dot2 = 0.5 * (q0 * gx + q2 * gz - q3 * gy);
        let mut q_dot3 = 0.5 * (q0 * gy - q1 * gz + q3 * gx);
        let mut q_dot4 = 0.5 * (q0 * gz + q1 * gy - q2 * gx);

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

            let two_q0mx = 2.0 * q0 * mx;
            let two_q0my = 2.0 * q0 * my;
            let two_q0mz = 2.0 * q0 * mz;
            let two_q1mx = 2.0 * q1 * mx;
            let two_q0 = 2.0 * q0;
            let two_q1 = 2.0 * q1;
            let two_q2 = 2.0 * q2;
            let two_q3 = 2.0 * q3;
            let two_q0q2 = 2.0 * q0 * q2;
            let two_q2q3 = 2.0 * q2 * q3;
            let q0q0 = q0 * q0;
            let q0q1 = q0 * q1;
            let q0q2 = q0 * q2;
            let q0q3 = q0 * q3;
            let q1q1 = q1 * q1;
            let q1q2 = q1 * q2;
            let q1q3 = q1 * q3;
            let q2q2 = q2 * q2;
            let q2q3 = q2 * q3;
            let q3q3 = q3 * q3;

            // Reference direction of Earth's magnetic field
            let hx = mx * q0q0 - two_q0my * q3 + two_q0mz * q2 + mx * q1q1 + two_q1 * my * q2
                + two_q1 * mz * q3
                - mx * q2q2
                - mx * q3q3;
            let hy = two_q0mx * q3 + my * q0q0 - two_q0mz * q1 + two_q1mx * q2 - my * q1q1
                + my * q2q2
                + two_q2 * mz * q3
                - my * q3q3;
            let two_bx = (hx * hx + hy * hy).sqrt();
            let two_bz = -two_q0mx * q2 + two_q0my * q1 + mz * q0q0 + two_q1mx * q3 - mz * q1q1
                + two_q2 * my * q3
                - mz * q2q2
                + mz * q3q3;
            let four_bx = 2.0 * two_bx;
            let four_bz = 2.0 * two_bz;

            // Gradient descent corrective step
            let mut s0 = -two_q2 * (2.0 * q1q3 - two_q0q2 - ax)
                + two_q1 * (2.0 * q0q1 + two_q2q3 - ay)
                - two_bz * q2 * (two_bx * (0.5 - q2q2 - q3q3) + two_bz * (q1q3 - q0q2) - mx)
                + (-two_bx * q3 + two_bz * q1)
                    * (two_bx * (q1q2 - q0q3) + two_bz * (q0q1 + q2q3) - my)
                + two_bx * q2 * (two_bx * (q0q2 + q1q3) + two_bz * (0.5 - q1q1 - q2q2) - mz);
            let mut s1 = two_q3 * (2.0 * q1q3 - two_q0q2 - ax)
                + two_q0 * (2.0 * q0q1 + two_q2q3 - ay)
                - 4.0 * q1 * (1.0 - 2.0 * q1q1 - 2.0 * q2q2 - az)
                + two_bz * q3 * (two_bx * (0.5 - q2q2 - q3q3) + two_bz * (q1q3 - q0q2) - mx)
                + (two_bx * q2 + two_bz * q0)
                    * (two_bx * (q1q2 - q0q3) + two_bz * (q0q1 + q2q3) - my)
                + (two_bx * q3 - four_bz * q1)
                    * (two_bx * (q0q2 + q1q3) + two_bz * (0.5 - q1q1 - q2q2) - mz);
            let mut s2 = -two_q0 * (2.0 * q1q3 - two_q0q2 - ax)
                + two_q3 * (2.0 * q0q1 + two_q2q3 - ay)
                - 4.0 * q2 * (1.0 - 2.0 * q1q1 - 2.0 * q2q2 - az)
                + (-four_bx * q2 - two_bz * q0)
                    * (two_bx * (0.5 - q2q2 - q3q3) + two_bz * (q1q3 - q0q2) - mx)
                + (two_bx * q1 + two_bz * q3)
                    * (two_bx * (q1q2 - q0q3) + two_bz * (q0q1 + q2q3) - my)
                + (two_bx * q0 - four_bz * q2)
                    * (two_bx * (q0q2 + q1q3) + two_bz * (0.5 - q1q1 - q2q2) - mz);
            let mut s3 = two_q1 * (2.0 * q1q3 - two_q0q2 - ax)
                + two_q2 * (2.0 * q0q1 + two_q2q3 - ay)
                + (-four_bx * q3 + two_bz * q1)
                    * (two_bx * (0.5 - q2q2 - q3q3) + two_bz * (q1q3 - q0q2) - mx)
                + (-two_bx * q0 + two_bz * q2)
                    * (two_bx * (q1q2 - q0q3) + two_bz * (q0q1 + q2q3) - my)
                + two_bx * q1 * (two_bx * (q0q2 + q1q3) + two_bz * (0.5 - q1q1 - q2q2) - mz);

            let step_norm = s0 * s0 + s1 * s1 + s2 * s2 + s3 * s3;
            if step_norm > 0.0 {
                let recip_norm = step_norm.powf(-0.5);
                s0 *= recip_norm;
                s1 *= recip_norm;
                s2 *= recip_norm;
                s3 *= recip_norm;

                q_dot1 -= self.beta * s0;
                q_dot2 -= self.beta * s1;
                q_dot3 -= self.beta * s2;
                q_dot4 -= self.beta * s3;
            }
        }

        self.integrate([q_dot1, q_dot2, q_dot3, q_dot4], dt);
    }

    fn integrate(&mut self, q_dot: [f64; 4], dt: f64) {
        self.q0 += q_dot[0] * dt;
        self.q1 += q_dot[1] * dt;
        self.q2 += q_dot[2] * dt;
        self.q3 += q_dot[3] * dt;

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
