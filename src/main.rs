fn main() -> anyhow::Result<()> {
    soundbutton_lib::run()
}
