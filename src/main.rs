fn main() {
    meteor_shooter::game::run();
}
